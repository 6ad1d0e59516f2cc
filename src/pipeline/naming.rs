//! Suggested output filenames.

use std::sync::LazyLock;

use regex::Regex;

const PAYSLIP_CATEGORY: &str = "bulletin_salaire";

static PERIOD_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"période\s*[:：]\s*([a-zéèêâûô]+)\s+(\d{4})").unwrap());
static NUMERIC_PERIOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{2})[/\s-](\d{4})\b").unwrap());
static MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(janvier|février|fevrier|mars|avril|mai|juin|juillet|août|aout|septembre|octobre|novembre|décembre|decembre)\s+(\d{4})\b")
        .unwrap()
});

const MONTHS: [&str; 12] = [
    "Janvier", "Février", "Mars", "Avril", "Mai", "Juin", "Juillet", "Août", "Septembre", "Octobre", "Novembre",
    "Décembre",
];

/// Filename to propose for a classified file. Payslips are renamed after
/// their pay period when one can be read from the text.
pub fn suggested_filename(category: &str, original: &str, text: &str) -> String {
    if category != PAYSLIP_CATEGORY {
        return original.to_string();
    }
    match pay_period(text) {
        Some((month, year)) => format!("Bulletin_de_salaire_{month}_{year}.pdf"),
        None => original.to_string(),
    }
}

/// (month name, year) of a payslip.
pub fn pay_period(text: &str) -> Option<(&'static str, u32)> {
    let lower = text.to_lowercase();

    if let Some(c) = PERIOD_LABEL.captures(&lower) {
        if let (Some(month), Some(year)) = (month_by_name(&c[1]), c[2].parse().ok()) {
            return Some((month, year));
        }
    }
    for c in NUMERIC_PERIOD.captures_iter(&lower) {
        let month = c[1].parse::<usize>().ok().filter(|m| (1..=12).contains(m));
        if let (Some(m), Ok(year)) = (month, c[2].parse()) {
            return Some((MONTHS[m - 1], year));
        }
    }
    let c = MONTH_YEAR.captures(&lower)?;
    Some((month_by_name(&c[1])?, c[2].parse().ok()?))
}

fn month_by_name(name: &str) -> Option<&'static str> {
    let normalized = match name {
        "fevrier" => "février",
        "aout" => "août",
        "decembre" => "décembre",
        other => other,
    };
    MONTHS.iter().copied().find(|m| m.to_lowercase() == normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_label() {
        let text = "BULLETIN DE SALAIRE\nPériode : Juillet 2025\nSalaire brut 2 500,00";
        assert_eq!(pay_period(text), Some(("Juillet", 2025)));
        assert_eq!(
            suggested_filename("bulletin_salaire", "scan.pdf", text),
            "Bulletin_de_salaire_Juillet_2025.pdf"
        );
    }

    #[test]
    fn numeric_period() {
        assert_eq!(pay_period("Paie du mois 02/2024 - net à payer"), Some(("Février", 2024)));
    }

    #[test]
    fn invalid_numeric_month_skipped() {
        assert_eq!(pay_period("Matricule 45-2023, période 03/2023"), Some(("Mars", 2023)));
    }

    #[test]
    fn month_name_without_label() {
        assert_eq!(pay_period("Bulletin de paie août 2023"), Some(("Août", 2023)));
        assert_eq!(pay_period("paie decembre 2022"), Some(("Décembre", 2022)));
    }

    #[test]
    fn no_period_keeps_name() {
        assert_eq!(suggested_filename("bulletin_salaire", "doc1.pdf", "salaire brut"), "doc1.pdf");
    }

    #[test]
    fn other_categories_keep_name() {
        assert_eq!(suggested_filename("rg", "meu_rg.jpg", "Période : Juillet 2025"), "meu_rg.jpg");
    }
}
