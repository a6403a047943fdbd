//! Static calorie reference for the dishes the model knows.
//!
//! Lookups are exact and case-sensitive. A name missing from the table is
//! not an error; the detection is reported with an `"Unknown"` portion and
//! no calorie figure.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutritionRecord {
    pub standard_portion_desc: &'static str,
    pub standard_portion_g: u32,
    pub calories_per_100g: u32,
}

impl NutritionRecord {
    const fn new(standard_portion_desc: &'static str, standard_portion_g: u32, calories_per_100g: u32) -> Self {
        Self {
            standard_portion_desc,
            standard_portion_g,
            calories_per_100g,
        }
    }

    /// Calories in one standard portion, rounded to 2 decimals.
    pub fn calories_estimate(&self) -> f64 {
        round_to(
            f64::from(self.standard_portion_g) * f64::from(self.calories_per_100g) / 100.0,
            2,
        )
    }
}

/// Portion and calorie fields attached to a detection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionEstimate {
    pub portion_desc: String,
    pub portion_g: Option<u32>,
    pub calories_estimate: Option<f64>,
}

pub const UNKNOWN_PORTION: &str = "Unknown";

// Sorted by name for binary search.
static FOOD_DATA: &[(&str, NutritionRecord)] = &[
    ("adhirasam", NutritionRecord::new("1 piece", 35, 337)),
    ("aloo_gobi", NutritionRecord::new("1 bowl", 150, 80)),
    ("aloo_matar", NutritionRecord::new("1 bowl", 150, 135)),
    ("aloo_methi", NutritionRecord::new("1 bowl", 150, 151)),
    ("aloo_shimla_mirch", NutritionRecord::new("1 bowl", 150, 138)),
    ("aloo_tikki", NutritionRecord::new("1 piece", 55, 200)),
    ("anarsa", NutritionRecord::new("1 piece", 25, 360)),
    ("ariselu", NutritionRecord::new("1 piece", 44, 300)),
    ("bandar_laddu", NutritionRecord::new("1 piece", 35, 356)),
    ("basundi", NutritionRecord::new("1 bowl", 150, 152)),
    ("bhatura", NutritionRecord::new("1 piece", 50, 400)),
    ("bhindi_masala", NutritionRecord::new("1 bowl", 150, 107)),
    ("biryani", NutritionRecord::new("1 plate", 300, 131)),
    ("boondi", NutritionRecord::new("1 small bowl (savory)", 30, 584)),
    ("butter_chicken", NutritionRecord::new("1 bowl", 240, 129)),
    ("chak_hao_kheer", NutritionRecord::new("1 bowl", 200, 148)),
    ("cham_cham", NutritionRecord::new("1 piece", 50, 240)),
    ("chana_masala", NutritionRecord::new("1 bowl", 240, 145)),
    ("chapati", NutritionRecord::new("1 chapati", 40, 300)),
    ("chhena_kheeri", NutritionRecord::new("1 bowl", 150, 231)),
    ("chicken_razala", NutritionRecord::new("1 bowl", 235, 140)),
    ("chicken_tikka", NutritionRecord::new("1 serving (6 pieces)", 150, 179)),
    ("chicken_tikka_masala", NutritionRecord::new("1 bowl", 240, 191)),
    ("chikki", NutritionRecord::new("1 small bar", 20, 520)),
    ("daal_baati_churma", NutritionRecord::new("1 serving (1 baati, 1 cup dal)", 250, 203)),
    ("daal_puri", NutritionRecord::new("1 puri", 45, 270)),
    ("dal_makhani", NutritionRecord::new("1 bowl", 250, 111)),
    ("dal_tadka", NutritionRecord::new("1 bowl", 250, 179)),
    ("dharwad_pedha", NutritionRecord::new("1 piece", 26, 446)),
    ("doodhpak", NutritionRecord::new("1 bowl", 200, 212)),
    ("double_ka_meetha", NutritionRecord::new("1 piece", 75, 385)),
    ("dum_aloo", NutritionRecord::new("1 bowl", 240, 170)),
    ("gajar_ka_halwa", NutritionRecord::new("1 bowl", 100, 345)),
    ("gavvalu", NutritionRecord::new("1 serving", 30, 422)),
    ("ghevar", NutritionRecord::new("1 piece", 150, 445)),
    ("gulab_jamun", NutritionRecord::new("1 piece", 45, 286)),
    ("imarti", NutritionRecord::new("1 piece", 25, 356)),
    ("jalebi", NutritionRecord::new("1 piece", 40, 450)),
    ("kachori", NutritionRecord::new("1 piece", 55, 513)),
    ("kadai_paneer", NutritionRecord::new("1 bowl", 240, 130)),
    ("kadhi_pakoda", NutritionRecord::new("1 bowl", 250, 79)),
    ("kajjikaya", NutritionRecord::new("1 piece (karanji)", 70, 350)),
    ("kakinada_khaja", NutritionRecord::new("1 piece", 34, 297)),
    ("kalakand", NutritionRecord::new("1 piece", 44, 386)),
    ("karela_bharta", NutritionRecord::new("1 serving", 150, 218)),
    ("kofta", NutritionRecord::new("1 bowl (malai kofta)", 250, 148)),
    ("kuzhi_paniyaram", NutritionRecord::new("1 piece", 30, 207)),
    ("lassi", NutritionRecord::new("1 glass", 180, 113)),
    ("ledikeni", NutritionRecord::new("1 piece", 40, 350)),
    ("litti_chokha", NutritionRecord::new("1 serving (2 litti, 1 bowl chokha)", 240, 138)),
    ("lyangcha", NutritionRecord::new("1 piece", 40, 350)),
    ("maach_jhol", NutritionRecord::new("1 bowl", 250, 85)),
    ("makki_di_roti_sarson_da_saag", NutritionRecord::new("1 roti, 1 bowl saag", 200, 150)),
    ("malapua", NutritionRecord::new("1 piece", 50, 350)),
    ("misi_roti", NutritionRecord::new("1 roti", 60, 306)),
    ("misti_doi", NutritionRecord::new("1 small cup", 100, 190)),
    ("modak", NutritionRecord::new("1 piece", 40, 288)),
    ("mysore_pak", NutritionRecord::new("1 piece", 40, 618)),
    ("naan", NutritionRecord::new("1 naan", 100, 336)),
    ("navrattan_korma", NutritionRecord::new("1 bowl", 240, 154)),
    ("palak_paneer", NutritionRecord::new("1 bowl", 240, 198)),
    ("paneer_butter_masala", NutritionRecord::new("1 bowl", 240, 150)),
    ("phirni", NutritionRecord::new("1 small cup", 100, 243)),
    ("pithe", NutritionRecord::new("1 piece (patishapta)", 60, 233)),
    ("poha", NutritionRecord::new("1 bowl", 150, 180)),
    ("poornalu", NutritionRecord::new("1 piece", 30, 350)),
    ("pootharekulu", NutritionRecord::new("1 piece", 40, 438)),
    ("qubani_ka_meetha", NutritionRecord::new("1 small cup", 100, 324)),
    ("rabri", NutritionRecord::new("1 serving", 100, 275)),
    ("ras_malai", NutritionRecord::new("1 small cup (2 pieces)", 100, 163)),
    ("rasgulla", NutritionRecord::new("1 piece", 50, 186)),
    ("sandesh", NutritionRecord::new("1 piece", 50, 250)),
    ("shankarpali", NutritionRecord::new("1 serving", 30, 422)),
    ("sheer_korma", NutritionRecord::new("1 small cup", 100, 288)),
    ("sheera", NutritionRecord::new("1 bowl (suji halwa)", 100, 360)),
    ("shrikhand", NutritionRecord::new("1 small cup", 100, 234)),
    ("sohan_halwa", NutritionRecord::new("1 piece", 30, 445)),
    ("sohan_papdi", NutritionRecord::new("1 piece", 21, 476)),
    ("sutar_feni", NutritionRecord::new("1 serving", 50, 476)),
    ("unni_appam", NutritionRecord::new("1 piece", 55, 345)),
];

pub fn lookup(name: &str) -> Option<&'static NutritionRecord> {
    FOOD_DATA
        .binary_search_by(|(key, _)| (*key).cmp(name))
        .ok()
        .map(|i| &FOOD_DATA[i].1)
}

pub fn estimate(name: &str) -> NutritionEstimate {
    match lookup(name) {
        Some(record) => NutritionEstimate {
            portion_desc: record.standard_portion_desc.to_string(),
            portion_g: Some(record.standard_portion_g),
            calories_estimate: Some(record.calories_estimate()),
        },
        None => NutritionEstimate {
            portion_desc: UNKNOWN_PORTION.to_string(),
            portion_g: None,
            calories_estimate: None,
        },
    }
}

pub fn known_foods() -> impl Iterator<Item = &'static str> {
    FOOD_DATA.iter().map(|(name, _)| *name)
}

/// Names from `names` that have no nutrition entry.
pub fn missing_entries<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    names.into_iter().filter(|name| lookup(name).is_none()).collect()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_sorted_and_unique() {
        assert!(FOOD_DATA.windows(2).all(|w| w[0].0 < w[1].0));
        assert_eq!(FOOD_DATA.len(), 80);
    }

    #[test]
    fn every_entry_is_reachable() {
        for (name, record) in FOOD_DATA {
            assert_eq!(lookup(name), Some(record));
        }
    }

    #[test]
    fn calories_follow_portion_formula() {
        let biryani = estimate("biryani");
        assert_eq!(biryani.portion_desc, "1 plate");
        assert_eq!(biryani.portion_g, Some(300));
        assert_eq!(biryani.calories_estimate, Some(393.0));

        // 35 * 337 / 100
        assert_eq!(estimate("adhirasam").calories_estimate, Some(117.95));
        // 21 * 476 / 100
        assert_eq!(estimate("sohan_papdi").calories_estimate, Some(99.96));
    }

    #[test]
    fn formula_holds_for_whole_table() {
        for (_, record) in FOOD_DATA {
            let expected = round_to(
                f64::from(record.standard_portion_g) * f64::from(record.calories_per_100g) / 100.0,
                2,
            );
            assert_eq!(record.calories_estimate(), expected);
        }
    }

    #[test]
    fn unknown_food_has_no_numbers() {
        let unknown = estimate("pizza");
        assert_eq!(unknown.portion_desc, "Unknown");
        assert_eq!(unknown.portion_g, None);
        assert_eq!(unknown.calories_estimate, None);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(lookup("naan").is_some());
        assert!(lookup("Naan").is_none());
        assert!(lookup("naan ").is_none());
    }

    #[test]
    fn reports_missing_names() {
        let missing = missing_entries(["naan", "class_7", "Poha"]);
        assert_eq!(missing, vec!["class_7", "Poha"]);
        assert_eq!(known_foods().count(), 80);
    }
}
