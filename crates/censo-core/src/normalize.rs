//! Field normalization for census rows.
//!
//! Worksheet cells arrive with inconsistent casing, accents, punctuation and
//! filler text. Everything that participates in identity matching or in the
//! closed bed-type vocabulary is funnelled through here.

/// Clean a raw RUT cell into its canonical form.
///
/// Keeps digits and the check letter `K` (uppercased), drops everything
/// else, then strips leading zeros. Placeholders such as `SIN-RUT` contain
/// no digits and clean to the empty string.
pub fn clean_rut(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == 'K' || *c == 'k')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let trimmed = kept.trim_start_matches('0');
    trimmed.to_string()
}

/// A RUT short enough to be a typo or a placeholder is not trusted for
/// identity registration.
pub fn is_plausible_rut(rut: &str) -> bool {
    rut.len() > 3
}

/// Replace Spanish accented letters with their base letter.
///
/// The census sheets only ever carry Latin-1 Spanish text, so an explicit
/// table covers the whole input alphabet.
pub fn strip_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'Á' | 'À' | 'Ä' | 'Â' => 'A',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

/// Normalize a patient name for identity matching.
///
/// Uppercases, folds accents, drops anything that is not A–Z or a space,
/// and collapses runs of spaces to one.
pub fn normalize_name(raw: &str) -> String {
    let upper = strip_accents(raw).to_uppercase();

    let mut out = String::with_capacity(upper.len());
    let mut last_was_space = true; // also trims leading spaces
    for c in upper.chars() {
        if c.is_ascii_uppercase() {
            out.push(c);
            last_was_space = false;
        } else if (c == ' ' || c.is_whitespace()) && !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Collapse a bed-type cell into the closed vocabulary.
///
/// Known variants fold together (`C.M.A` and `CIRUGÍA MAYOR AMBULATORIA`
/// become `CMA`; `MEDIO` and `CAMA MEDIA` become `MEDIA`); an empty cell
/// becomes `INDEFINIDO`; anything else passes through uppercased.
pub fn normalize_bed_type(raw: &str) -> String {
    let upper = strip_accents(raw.trim()).to_uppercase();

    if upper.is_empty() {
        return "INDEFINIDO".to_string();
    }
    if upper == "C.M.A" || upper == "C.M.A." || upper.contains("MAYOR AMBULATORIA") {
        return "CMA".to_string();
    }
    if upper == "MEDIO" || upper == "CAMA MEDIA" {
        return "MEDIA".to_string();
    }
    upper
}

/// Interpret a UPC-column cell as the critical-care flag.
///
/// `SI` and `X` mean yes; so does any cell naming a critical-care unit.
pub fn parse_upc_flag(raw: &str) -> bool {
    let upper = strip_accents(raw.trim()).to_uppercase();
    if upper == "SI" || upper == "X" {
        return true;
    }
    upper.contains("UPC") || upper.contains("UCI") || upper.contains("UTI")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── clean_rut ─────────────────────────────────────────────────────────────

    #[test]
    fn test_clean_rut_strips_punctuation() {
        assert_eq!(clean_rut("12.345.678-9"), "123456789");
        assert_eq!(clean_rut("12345678-9"), "123456789");
    }

    #[test]
    fn test_clean_rut_keeps_check_letter() {
        assert_eq!(clean_rut("7.654.321-k"), "7654321K");
        assert_eq!(clean_rut("7654321-K"), "7654321K");
    }

    #[test]
    fn test_clean_rut_strips_leading_zeros() {
        assert_eq!(clean_rut("012.345.678-9"), "123456789");
    }

    #[test]
    fn test_clean_rut_placeholder_cleans_to_empty() {
        // The source data sometimes writes SIN-RUT instead of leaving the
        // cell empty. Only the K check letter survives cleaning of letters,
        // and SIN-RUT has none.
        assert_eq!(clean_rut("SIN-RUT"), "");
        assert_eq!(clean_rut(""), "");
        assert_eq!(clean_rut("   "), "");
    }

    #[test]
    fn test_is_plausible_rut() {
        assert!(is_plausible_rut("123456789"));
        assert!(!is_plausible_rut("19"));
        assert!(!is_plausible_rut(""));
    }

    // ── normalize_name ────────────────────────────────────────────────────────

    #[test]
    fn test_normalize_name_accents_and_case() {
        assert_eq!(normalize_name("Pérez Núñez, José"), "PEREZ NUNEZ JOSE");
    }

    #[test]
    fn test_normalize_name_collapses_whitespace() {
        assert_eq!(normalize_name("  MARIA   DEL  CARMEN "), "MARIA DEL CARMEN");
    }

    #[test]
    fn test_normalize_name_drops_digits_and_symbols() {
        assert_eq!(normalize_name("SOTO (cama 12)"), "SOTO CAMA");
    }

    #[test]
    fn test_normalize_name_empty() {
        assert_eq!(normalize_name(""), "");
        assert_eq!(normalize_name("123-456"), "");
    }

    // ── strip_accents ─────────────────────────────────────────────────────────

    #[test]
    fn test_strip_accents() {
        assert_eq!(strip_accents("PATOLOGÍA"), "PATOLOGIA");
        assert_eq!(strip_accents("cirugía"), "cirugia");
        assert_eq!(strip_accents("ñandú"), "nandu");
    }

    // ── normalize_bed_type ────────────────────────────────────────────────────

    #[test]
    fn test_bed_type_cma_variants() {
        assert_eq!(normalize_bed_type("C.M.A"), "CMA");
        assert_eq!(normalize_bed_type("c.m.a."), "CMA");
        assert_eq!(normalize_bed_type("Cirugía Mayor Ambulatoria"), "CMA");
    }

    #[test]
    fn test_bed_type_media_variants() {
        assert_eq!(normalize_bed_type("medio"), "MEDIA");
        assert_eq!(normalize_bed_type("CAMA MEDIA"), "MEDIA");
        assert_eq!(normalize_bed_type("MEDIA"), "MEDIA");
    }

    #[test]
    fn test_bed_type_empty_is_indefinido() {
        assert_eq!(normalize_bed_type(""), "INDEFINIDO");
        assert_eq!(normalize_bed_type("   "), "INDEFINIDO");
    }

    #[test]
    fn test_bed_type_passthrough_uppercased() {
        assert_eq!(normalize_bed_type("pensionado"), "PENSIONADO");
        assert_eq!(normalize_bed_type("UTI"), "UTI");
    }

    // ── parse_upc_flag ────────────────────────────────────────────────────────

    #[test]
    fn test_upc_flag_si_and_x() {
        assert!(parse_upc_flag("SI"));
        assert!(parse_upc_flag("si"));
        assert!(parse_upc_flag("X"));
        assert!(parse_upc_flag(" x "));
    }

    #[test]
    fn test_upc_flag_unit_names() {
        assert!(parse_upc_flag("UPC"));
        assert!(parse_upc_flag("cama UCI"));
        assert!(parse_upc_flag("UTI 3"));
    }

    #[test]
    fn test_upc_flag_negative() {
        assert!(!parse_upc_flag(""));
        assert!(!parse_upc_flag("NO"));
        assert!(!parse_upc_flag("MEDIA"));
    }
}
