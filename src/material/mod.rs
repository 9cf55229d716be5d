// src/material/mod.rs

mod prompts;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Film families the checksheets cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Material {
    #[default]
    Lldpe,
    Cpp,
    Vmcpp,
    Pet,
    Vmpet,
    Opp,
}

impl Material {
    pub const ALL: [Material; 6] = [
        Material::Lldpe,
        Material::Cpp,
        Material::Vmcpp,
        Material::Pet,
        Material::Vmpet,
        Material::Opp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Material::Lldpe => "LLDPE",
            Material::Cpp => "CPP",
            Material::Vmcpp => "VMCPP",
            Material::Pet => "PET",
            Material::Vmpet => "VMPET",
            Material::Opp => "OPP",
        }
    }

    pub fn profile(self) -> &'static MaterialProfile {
        match self {
            Material::Lldpe => &LLDPE,
            Material::Cpp => &CPP,
            Material::Vmcpp => &VMCPP,
            Material::Pet => &PET,
            Material::Vmpet => &VMPET,
            Material::Opp => &OPP,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown material '{0}'")]
pub struct UnknownMaterial(pub String);

impl FromStr for Material {
    type Err = UnknownMaterial;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Material::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownMaterial(s.to_string()))
    }
}

/// One cell of a sheet row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Field(&'static str),
    Blank,
}

/// Ordered column layout of one sheet row.
pub type Layout = &'static [Column];

/// A field shown in the correction form.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
}

/// Everything that differs between material families.
#[derive(Debug)]
pub struct MaterialProfile {
    pub material: Material,
    pub prompt: &'static str,
    /// Film name that starts the editable size label.
    pub film_prefix: &'static str,
    pub suppliers: &'static [&'static str],
    pub fields: &'static [FieldSpec],
    pub layout: Layout,
}

// Keys shared by every prompt and form.
pub const KEY_FILM: &str = "film";
pub const KEY_BATCH: &str = "no_batch";
pub const KEY_ARRIVAL: &str = "tgl_datang";
pub const KEY_SUPPLIER: &str = "supplier";
pub const KEY_WIDTH: &str = "lebar";
pub const KEY_THICKNESS: &str = "thickness";

use Column::{Blank, Field};

macro_rules! with_header {
    ($($extra:expr),* $(,)?) => {
        &[
            field("tanggal", "Tanggal"),
            field("no_surat_jalan", "No Surat Jalan"),
            field("no_po", "No PO"),
            field(KEY_BATCH, "No Batch"),
            field(KEY_ARRIVAL, "Tanggal Datang (dari batch)"),
            field("jml_datang", "Jumlah Datang"),
            field(KEY_SUPPLIER, "Supplier"),
            $($extra),*
        ]
    };
}

const fn field(key: &'static str, label: &'static str) -> FieldSpec {
    FieldSpec { key, label }
}

/// The historical LLDPE row, 22 columns.
pub const FILM_LLDPE: Layout = &[
    Field("tanggal"),
    Field(KEY_FILM),
    Field("no_surat_jalan"),
    Field("no_po"),
    Field(KEY_BATCH),
    Field(KEY_ARRIVAL),
    Blank,
    Field("jml_datang"),
    Blank,
    Field("cof"),
    Field("seal_temp"),
    Field("hasil_seal"),
    Field("tensile_md"),
    Field("tensile_td"),
    Field("elongation_md"),
    Field("elongation_td"),
    Field("modulus_md"),
    Field("modulus_td"),
    Blank,
    Blank,
    Field(KEY_SUPPLIER),
    Field("sampling_size"),
];

/// CPP and VMCPP, 24 columns.
pub const FILM_CPP: Layout = &[
    Field("tanggal"),
    Field(KEY_FILM),
    Field("no_surat_jalan"),
    Field("no_po"),
    Field(KEY_BATCH),
    Field(KEY_ARRIVAL),
    Blank,
    Field("jml_datang"),
    Blank,
    Field("cof"),
    Field("seal_temp"),
    Field("seal_strength"),
    Field("tensile_md"),
    Field("tensile_td"),
    Field("elongation_md"),
    Field("elongation_td"),
    Field("corona"),
    Field("optical_density"),
    Field("metal_bond"),
    Blank,
    Blank,
    Blank,
    Field(KEY_SUPPLIER),
    Field("sampling_size"),
];

/// PET and VMPET, 22 columns.
pub const FILM_PET: Layout = &[
    Field("tanggal"),
    Field(KEY_FILM),
    Field("no_surat_jalan"),
    Field("no_po"),
    Field(KEY_BATCH),
    Field(KEY_ARRIVAL),
    Blank,
    Field("jml_datang"),
    Blank,
    Field("tensile_md"),
    Field("tensile_td"),
    Field("elongation_md"),
    Field("elongation_td"),
    Field("shrinkage_md"),
    Field("shrinkage_td"),
    Field("corona"),
    Field("optical_density"),
    Field("metal_bond"),
    Blank,
    Blank,
    Field(KEY_SUPPLIER),
    Field("sampling_size"),
];

/// OPP, 20 columns.
pub const FILM_OPP: Layout = &[
    Field("tanggal"),
    Field(KEY_FILM),
    Field("no_surat_jalan"),
    Field("no_po"),
    Field(KEY_BATCH),
    Field(KEY_ARRIVAL),
    Blank,
    Field("jml_datang"),
    Blank,
    Field("cof"),
    Field("seal_temp"),
    Field("tensile_md"),
    Field("tensile_td"),
    Field("elongation_md"),
    Field("elongation_td"),
    Field("corona"),
    Field("haze"),
    Blank,
    Field(KEY_SUPPLIER),
    Field("sampling_size"),
];

static LLDPE: MaterialProfile = MaterialProfile {
    material: Material::Lldpe,
    prompt: prompts::LLDPE,
    film_prefix: "LLDPE",
    suppliers: &["BLASFOLIE", "SAKA", "NUSA EKA", "PANVERTA"],
    fields: with_header![
        field("tensile_md", "Tensile MD (Row 8)"),
        field("tensile_td", "Tensile TD (Row 8)"),
        field("elongation_md", "Elongation MD (Row 9)"),
        field("elongation_td", "Elongation TD (Row 9)"),
        field("modulus_md", "Modulus MD (Row 10)"),
        field("modulus_td", "Modulus TD (Row 10)"),
    ],
    layout: FILM_LLDPE,
};

static CPP: MaterialProfile = MaterialProfile {
    material: Material::Cpp,
    prompt: prompts::CPP,
    film_prefix: "CPP",
    suppliers: &["PANVERTA", "TRIAS", "ARGHA KARYA"],
    fields: with_header![
        field("cof", "COF"),
        field("seal_strength", "Seal Strength"),
        field("tensile_md", "Tensile MD"),
        field("tensile_td", "Tensile TD"),
        field("elongation_md", "Elongation MD"),
        field("elongation_td", "Elongation TD"),
        field("corona", "Corona (dyne)"),
    ],
    layout: FILM_CPP,
};

static VMCPP: MaterialProfile = MaterialProfile {
    material: Material::Vmcpp,
    prompt: prompts::VMCPP,
    film_prefix: "VMCPP",
    suppliers: &["PANVERTA", "TRIAS", "ARGHA KARYA"],
    fields: with_header![
        field("cof", "COF"),
        field("seal_strength", "Seal Strength"),
        field("tensile_md", "Tensile MD"),
        field("tensile_td", "Tensile TD"),
        field("optical_density", "Optical Density"),
        field("metal_bond", "Metal Bond"),
    ],
    layout: FILM_CPP,
};

static PET: MaterialProfile = MaterialProfile {
    material: Material::Pet,
    prompt: prompts::PET,
    film_prefix: "PET",
    suppliers: &["TRIAS", "ARGHA KARYA", "POLYPLEX"],
    fields: with_header![
        field("tensile_md", "Tensile MD"),
        field("tensile_td", "Tensile TD"),
        field("elongation_md", "Elongation MD"),
        field("elongation_td", "Elongation TD"),
        field("shrinkage_md", "Shrinkage MD"),
        field("shrinkage_td", "Shrinkage TD"),
        field("corona", "Corona (dyne)"),
    ],
    layout: FILM_PET,
};

static VMPET: MaterialProfile = MaterialProfile {
    material: Material::Vmpet,
    prompt: prompts::VMPET,
    film_prefix: "VMPET",
    suppliers: &["TRIAS", "ARGHA KARYA", "POLYPLEX"],
    fields: with_header![
        field("tensile_md", "Tensile MD"),
        field("tensile_td", "Tensile TD"),
        field("elongation_md", "Elongation MD"),
        field("elongation_td", "Elongation TD"),
        field("optical_density", "Optical Density"),
        field("metal_bond", "Metal Bond"),
    ],
    layout: FILM_PET,
};

static OPP: MaterialProfile = MaterialProfile {
    material: Material::Opp,
    prompt: prompts::OPP,
    film_prefix: "OPP",
    suppliers: &["TRIAS", "INDOPOLY", "ARGHA KARYA"],
    fields: with_header![
        field("cof", "COF"),
        field("seal_temp", "Seal Temp"),
        field("tensile_md", "Tensile MD"),
        field("tensile_td", "Tensile TD"),
        field("elongation_md", "Elongation MD"),
        field("elongation_td", "Elongation TD"),
        field("corona", "Corona (dyne)"),
        field("haze", "Haze (%)"),
    ],
    layout: FILM_OPP,
};

impl MaterialProfile {
    /// Editable size label, e.g. `LLDPE 790mm x 75µm`.
    pub fn film_label(&self, width: &str, thickness: &str) -> String {
        format!("{} {}mm x {}µm", self.film_prefix, width.trim(), thickness.trim())
    }

    /// Supplier vocabulary entry matching `extracted`, else the first entry.
    pub fn pick_supplier(&self, extracted: &str) -> &'static str {
        let squash = |s: &str| {
            s.split_whitespace()
                .collect::<String>()
                .to_ascii_uppercase()
        };
        let wanted = squash(extracted);
        self.suppliers
            .iter()
            .copied()
            .find(|s| squash(s) == wanted)
            .unwrap_or(self.suppliers[0])
    }

    /// Lay `values` out in sheet column order; missing keys become empty cells.
    pub fn assemble_row(&self, values: &BTreeMap<String, String>) -> Vec<String> {
        self.layout
            .iter()
            .map(|col| match col {
                Field(key) => values.get(*key).cloned().unwrap_or_default(),
                Blank => String::new(),
            })
            .collect()
    }
}
