use std::fmt::Write as _;

use crate::material::{FieldSpec, KEY_FILM, KEY_SUPPLIER, Material, MaterialProfile};
use crate::session::{Flash, ScanResult, Session};

/// Escape text for HTML element content and quoted attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;max-width:760px;margin:1rem auto;padding:0 1rem}\
.flash{padding:.6rem;margin:.4rem 0;border-radius:4px}\
.success{background:#e3f6e5}.warning{background:#fff4d6}.error{background:#fde2e1}\
.grid{display:grid;grid-template-columns:1fr 1fr;gap:.4rem 1rem}\
label{display:block;font-size:.85rem;color:#444}input,select{width:100%;padding:.3rem}\
img{max-width:100%;border:1px solid #ccc}.row{display:flex;gap:.5rem;margin:.5rem 0}";

fn material_select(selected: Material) -> String {
    let mut html = String::from("<select name=\"material\">");
    for m in Material::ALL {
        let sel = if m == selected { " selected" } else { "" };
        let _ = write!(html, "<option value=\"{m}\"{sel}>{m}</option>");
    }
    html.push_str("</select>");
    html
}

fn flashes(items: &[Flash]) -> String {
    items
        .iter()
        .map(|f| {
            let (class, text) = match f {
                Flash::Success(t) => ("success", t),
                Flash::Warning(t) => ("warning", t),
                Flash::Error(t) => ("error", t),
            };
            format!("<div class=\"flash {class}\">{}</div>", escape(text))
        })
        .collect()
}

fn text_input(name: &str, label: &str, value: &str) -> String {
    format!(
        "<div><label for=\"{name}\">{}</label>\
         <input id=\"{name}\" name=\"{name}\" value=\"{}\"></div>",
        escape(label),
        escape(value)
    )
}

fn supplier_select(profile: &MaterialProfile, value: &str) -> String {
    let mut html = format!("<div><label for=\"{KEY_SUPPLIER}\">Supplier</label><select id=\"{KEY_SUPPLIER}\" name=\"{KEY_SUPPLIER}\">");
    for s in profile.suppliers {
        let sel = if *s == value { " selected" } else { "" };
        let _ = write!(html, "<option{sel}>{}</option>", escape(s));
    }
    html.push_str("</select></div>");
    html
}

fn correction_form(scan: &ScanResult) -> String {
    let profile = scan.material.profile();
    let values = scan.form_values();
    let value = |key: &str| values.get(key).map(String::as_str).unwrap_or_default();

    let mut html = format!(
        "<h2>Scan result ({})</h2>\
         <p>Scan time: {:.2} s, photo rotated {}°</p>\
         <form method=\"post\" action=\"/submit\">",
        profile.material,
        scan.duration.as_secs_f64(),
        scan.rotation.degrees()
    );
    html.push_str(&text_input(KEY_FILM, "Ukuran", value(KEY_FILM)));
    html.push_str("<div class=\"grid\">");
    for &FieldSpec { key, label } in profile.fields {
        if key == KEY_SUPPLIER {
            html.push_str(&supplier_select(profile, value(key)));
        } else {
            html.push_str(&text_input(key, label, value(key)));
        }
    }
    html.push_str(
        "</div><div class=\"row\"><button type=\"submit\">Confirm &amp; send</button></div></form>",
    );
    html
}

/// The whole operator page for the current session state.
pub fn render(session: &Session, notices: &[Flash]) -> String {
    let mut html = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
         <title>QC Scanner</title><style>{STYLE}</style></head><body>\
         <h1>QC Single Scanner</h1>\
         <p>Scan one checksheet at a time for accurate test values.</p>{}",
        flashes(notices)
    );

    let _ = write!(
        html,
        "<form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\
         <label for=\"photo\">Checksheet photo</label>\
         <input id=\"photo\" type=\"file\" name=\"photo\" accept=\".jpg,.jpeg,.png,image/jpeg,image/png\">\
         <div class=\"row\">{}<button type=\"submit\">Upload</button></div></form>",
        material_select(session.material)
    );

    if let Some(photo) = &session.photo {
        let _ = write!(
            html,
            "<img src=\"/photo?v={}-{}\" alt=\"{}\">\
             <div class=\"row\"><form method=\"post\" action=\"/rotate\">\
             <button type=\"submit\">Rotate 90°</button></form>\
             <form method=\"post\" action=\"/analyze\">{}\
             <button type=\"submit\">Start analysis</button></form></div>",
            &photo.digest[..photo.digest.len().min(12)],
            session.rotation.degrees(),
            escape(&photo.filename),
            material_select(session.material)
        );
    }

    match &session.scan {
        Some(scan) => html.push_str(&correction_form(scan)),
        None if session.submitted => html.push_str(
            "<p>Data sent. Start a new analysis for the next checksheet.</p>",
        ),
        None => {}
    }

    html.push_str("</body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heuristics::refine_batch;
    use crate::imaging::Rotation;
    use std::time::Duration;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn empty_session_shows_only_upload() {
        let html = render(&Session::default(), &[]);
        assert!(html.contains("action=\"/upload\""));
        assert!(!html.contains("action=\"/analyze\""));
        assert!(!html.contains("action=\"/submit\""));
    }

    #[test]
    fn correction_form_is_prefilled() {
        let mut session = Session::default();
        session.material = Material::Opp;
        session.store_scan(ScanResult {
            fields: [("no_batch", "24a01/ip/24a01/idp"), ("haze", "<2")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            batch: refine_batch("24a01/ip/24a01/idp"),
            material: Material::Opp,
            rotation: Rotation::default().turned(),
            digest: "0123456789abcdef".into(),
            duration: Duration::from_millis(2350),
        });

        let html = render(&session, &[Flash::Success("Analysis done".into())]);
        assert!(html.contains("value=\"24A01/IP/24A01/IDP\""));
        assert!(html.contains("value=\"01-10-2024\""));
        assert!(html.contains("value=\"&lt;2\""));
        assert!(html.contains("<option selected>TRIAS</option>"));
        assert!(html.contains("Scan time: 2.35 s, photo rotated 90°"));
        assert!(html.contains("flash success"));
    }

    #[test]
    fn sent_state_is_announced() {
        let mut session = Session::default();
        session.mark_submitted();
        assert!(render(&session, &[]).contains("Data sent."));
    }
}
