// src/material/prompts.rs
//
// Instruction prompts sent with the checksheet photo. JSON keys here must
// match the field keys used by the profiles and layouts in `super`.

pub const LLDPE: &str = r#"Analyse this LLDPE incoming-material checksheet very carefully.
Focus on the technical test table, rows 8, 9 and 10.

RESULT ROWS:
1. Row 8 (Tensile): take the MD value (top) and the TD value (bottom).
2. Row 9 (Elongation): take MD (top) and TD (bottom). A value may read '> 1400'.
3. Row 10 (Modulus Young): take MD (top) and TD (bottom).

SIZE:
1. Find the row labelled 'Ukuran' in the header.
2. The number before 'mm' is "lebar" (example: 790).
3. The number before 'um' or 'u' is "thickness" (example: 75).
4. Do NOT take width or thickness from result rows 2 and 3. Use the header 'Ukuran' row only.

BATCH NUMBER:
"no_batch" is stamped like 24C15/SB/24C15/BLF/FZF. Copy every character and every '/' exactly as written.

Return JSON only (no ```json fences):
{
  "tanggal": "dd-mm-yyyy", "ukuran": "xx μm x XXX mm", "lebar": "", "thickness": "",
  "no_surat_jalan": "", "no_po": "PO-XX-XXXXXX", "no_batch": "", "jml_datang": "",
  "cof": "0.XX / 0.XX", "seal_temp": "", "hasil_seal": "",
  "tensile_md": "", "tensile_td": "", "elongation_md": "", "elongation_td": "",
  "modulus_md": "", "modulus_td": "",
  "supplier": "one of: BLASFOLIE/SAKA/NUSA EKA/PANVERTA", "sampling_size": ""
}
Use a point (.) for decimals. Do not guess unreadable writing; leave it empty."#;

pub const CPP: &str = r#"Analyse this CPP (cast polypropylene) incoming-material checksheet very carefully.

SIZE:
Read the header 'Ukuran' row. The number before 'mm' is "lebar", the number before 'um' or 'u' is "thickness".
The film name on the sheet starts with 'CPP' (for example 'CPP GEN', 'CPP RCPP'); do not confuse it with VMCPP.

TEST TABLE:
- COF: static / dynamic, written as "0.XX / 0.XX".
- Seal temperature and seal strength (N/15mm).
- Tensile MD and TD, Elongation MD and TD.
- Corona treatment level in dyne.

DELIVERY NOTE:
"no_surat_jalan" usually reads like SJ/XXX/MM/YYYY or a plain 6-10 digit number. Copy it exactly.

BATCH NUMBER:
"no_batch" is stamped like 24C15/SB/24C15/PVT. Copy every character and every '/' exactly as written.

Return JSON only (no ```json fences):
{
  "tanggal": "dd-mm-yyyy", "ukuran": "", "lebar": "", "thickness": "",
  "no_surat_jalan": "", "no_po": "PO-XX-XXXXXX", "no_batch": "", "jml_datang": "",
  "cof": "0.XX / 0.XX", "seal_temp": "", "seal_strength": "",
  "tensile_md": "", "tensile_td": "", "elongation_md": "", "elongation_td": "",
  "corona": "",
  "supplier": "one of: PANVERTA/TRIAS/ARGHA KARYA", "sampling_size": ""
}
Use a point (.) for decimals. Do not guess unreadable writing; leave it empty."#;

pub const VMCPP: &str = r#"Analyse this VMCPP (metallized cast polypropylene) incoming-material checksheet very carefully.

SIZE:
Read the header 'Ukuran' row. The number before 'mm' is "lebar", the number before 'um' or 'u' is "thickness".
The film name on the sheet starts with 'VMCPP' or 'MCPP'.

TEST TABLE:
- COF: static / dynamic, written as "0.XX / 0.XX".
- Seal temperature and seal strength (N/15mm).
- Tensile MD and TD, Elongation MD and TD.
- Optical density (OD), usually between 1.8 and 3.0.
- Metal bond / metal adhesion (g/inch or tape test result).

DELIVERY NOTE:
"no_surat_jalan" usually reads like SJ/XXX/MM/YYYY or a plain 6-10 digit number. Copy it exactly.

BATCH NUMBER:
"no_batch" is stamped like 24C15/SB/24C15/PVT. Copy every character and every '/' exactly as written.

Return JSON only (no ```json fences):
{
  "tanggal": "dd-mm-yyyy", "ukuran": "", "lebar": "", "thickness": "",
  "no_surat_jalan": "", "no_po": "PO-XX-XXXXXX", "no_batch": "", "jml_datang": "",
  "cof": "0.XX / 0.XX", "seal_temp": "", "seal_strength": "",
  "tensile_md": "", "tensile_td": "", "elongation_md": "", "elongation_td": "",
  "optical_density": "", "metal_bond": "",
  "supplier": "one of: PANVERTA/TRIAS/ARGHA KARYA", "sampling_size": ""
}
Use a point (.) for decimals. Do not guess unreadable writing; leave it empty."#;

pub const PET: &str = r#"Analyse this PET (polyester) incoming-material checksheet very carefully.

SIZE:
Read the header 'Ukuran' row. The number before 'mm' is "lebar", the number before 'um' or 'u' is "thickness" (typically 12).
The film name on the sheet starts with 'PET' (for example 'PET PLAIN', 'PET CHEM'); do not confuse it with VMPET.

TEST TABLE:
- Tensile MD and TD, Elongation MD and TD.
- Heat shrinkage MD and TD in percent.
- Corona / surface treatment level in dyne.

DELIVERY NOTE:
"no_surat_jalan" usually reads like SJ/XXX/MM/YYYY or DO-XXXXXX. Copy it exactly.

BATCH NUMBER:
"no_batch" is stamped like 24C15/TR/24C15/TSI. Copy every character and every '/' exactly as written.

Return JSON only (no ```json fences):
{
  "tanggal": "dd-mm-yyyy", "ukuran": "", "lebar": "", "thickness": "",
  "no_surat_jalan": "", "no_po": "PO-XX-XXXXXX", "no_batch": "", "jml_datang": "",
  "tensile_md": "", "tensile_td": "", "elongation_md": "", "elongation_td": "",
  "shrinkage_md": "", "shrinkage_td": "", "corona": "",
  "supplier": "one of: TRIAS/ARGHA KARYA/POLYPLEX", "sampling_size": ""
}
Use a point (.) for decimals. Do not guess unreadable writing; leave it empty."#;

pub const VMPET: &str = r#"Analyse this VMPET (metallized polyester) incoming-material checksheet very carefully.

SIZE:
Read the header 'Ukuran' row. The number before 'mm' is "lebar", the number before 'um' or 'u' is "thickness" (typically 12).
The film name on the sheet starts with 'VMPET' or 'MPET'.

TEST TABLE:
- Tensile MD and TD, Elongation MD and TD.
- Optical density (OD), usually between 2.0 and 3.2.
- Metal bond / metal adhesion (g/inch or tape test result).

DELIVERY NOTE:
"no_surat_jalan" usually reads like SJ/XXX/MM/YYYY or DO-XXXXXX. Copy it exactly.

BATCH NUMBER:
"no_batch" is stamped like 24C15/TR/24C15/TSI. Copy every character and every '/' exactly as written.

Return JSON only (no ```json fences):
{
  "tanggal": "dd-mm-yyyy", "ukuran": "", "lebar": "", "thickness": "",
  "no_surat_jalan": "", "no_po": "PO-XX-XXXXXX", "no_batch": "", "jml_datang": "",
  "tensile_md": "", "tensile_td": "", "elongation_md": "", "elongation_td": "",
  "optical_density": "", "metal_bond": "",
  "supplier": "one of: TRIAS/ARGHA KARYA/POLYPLEX", "sampling_size": ""
}
Use a point (.) for decimals. Do not guess unreadable writing; leave it empty."#;

pub const OPP: &str = r#"Analyse this OPP / BOPP (oriented polypropylene) incoming-material checksheet very carefully.

SIZE:
Read the header 'Ukuran' row. The number before 'mm' is "lebar", the number before 'um' or 'u' is "thickness".
The film name on the sheet starts with 'OPP' or 'BOPP' (for example 'BOPP HS', 'OPP PEARL').

TEST TABLE:
- COF: static / dynamic, written as "0.XX / 0.XX".
- Seal temperature.
- Tensile MD and TD, Elongation MD and TD.
- Corona treatment level in dyne.
- Haze in percent.

DELIVERY NOTE:
"no_surat_jalan" usually reads like SJ/XXX/MM/YYYY or a plain 6-10 digit number. Copy it exactly.

BATCH NUMBER:
"no_batch" is stamped like 24C15/IP/24C15/IDP. Copy every character and every '/' exactly as written.

Return JSON only (no ```json fences):
{
  "tanggal": "dd-mm-yyyy", "ukuran": "", "lebar": "", "thickness": "",
  "no_surat_jalan": "", "no_po": "PO-XX-XXXXXX", "no_batch": "", "jml_datang": "",
  "cof": "0.XX / 0.XX", "seal_temp": "",
  "tensile_md": "", "tensile_td": "", "elongation_md": "", "elongation_td": "",
  "corona": "", "haze": "",
  "supplier": "one of: TRIAS/INDOPOLY/ARGHA KARYA", "sampling_size": ""
}
Use a point (.) for decimals. Do not guess unreadable writing; leave it empty."#;
