use crate::model::types::StandardResidue;
use std::collections::HashMap;
use std::str::FromStr;

/// Residue naming rules shared by the structure readers.
///
/// Maps force-field variants and common modified residues onto the standard residue they
/// stand in for, so that a selenomethionine or a protonated histidine is still treated as
/// part of the polymer.
#[derive(Debug, Clone)]
pub struct IoContext {
    alias_map: HashMap<String, String>,
}

impl IoContext {
    pub fn new_default() -> Self {
        let mut alias_map = HashMap::new();

        macro_rules! register_aliases {
            ($canonical:expr => [$($alias:expr),+ $(,)?]) => {
                $(alias_map.insert($alias.to_string(), $canonical.to_string());)+
            };
        }

        register_aliases!("ARG" => ["ARN"]);
        register_aliases!("ASP" => ["ASH"]);
        register_aliases!("CYS" => ["CYM", "CYX", "CSO", "CSD", "CME"]);
        register_aliases!("GLU" => ["GLH", "PCA"]);
        register_aliases!("HIS" => ["HID", "HIE", "HIP", "HSD", "HSE", "HSP"]);
        register_aliases!("LYS" => ["LYN", "MLY", "KCX"]);
        register_aliases!("MET" => ["MSE", "FME"]);
        register_aliases!("PRO" => ["HYP"]);
        register_aliases!("SER" => ["SEP"]);
        register_aliases!("THR" => ["TPO"]);
        register_aliases!("TYR" => ["TYM", "PTR"]);
        register_aliases!("HOH" => ["WAT", "SOL", "TIP", "TIP3", "TP3", "SPC", "DOD"]);

        Self { alias_map }
    }

    /// Returns the canonical residue name for `name`, or `name` itself when no alias applies.
    pub fn resolve_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.alias_map.get(name).map(|s| s.as_str()).unwrap_or(name)
    }

    pub fn add_alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.alias_map.insert(alias.into(), canonical.into());
    }

    /// Resolves aliases and maps the result onto a standard residue, if any.
    pub fn classify_residue(&self, raw_name: &str) -> Option<StandardResidue> {
        StandardResidue::from_str(self.resolve_name(raw_name.trim())).ok()
    }
}

impl Default for IoContext {
    fn default() -> Self {
        Self::new_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_names_classify_without_aliases() {
        let context = IoContext::new_default();

        assert_eq!(context.classify_residue("ALA"), Some(StandardResidue::ALA));
        assert_eq!(context.classify_residue("DA"), Some(StandardResidue::DA));
        assert_eq!(context.classify_residue("HOH"), Some(StandardResidue::HOH));
        assert_eq!(context.resolve_name("GLY"), "GLY");
    }

    #[test]
    fn force_field_variants_resolve_to_parent_residue() {
        let context = IoContext::new_default();

        assert_eq!(context.classify_residue("HID"), Some(StandardResidue::HIS));
        assert_eq!(context.classify_residue("CYX"), Some(StandardResidue::CYS));
        assert_eq!(context.classify_residue("ASH"), Some(StandardResidue::ASP));
    }

    #[test]
    fn modified_residues_and_water_models_resolve() {
        let context = IoContext::new_default();

        assert_eq!(context.classify_residue("MSE"), Some(StandardResidue::MET));
        assert_eq!(context.classify_residue("SEP"), Some(StandardResidue::SER));
        assert_eq!(context.classify_residue("WAT"), Some(StandardResidue::HOH));
        assert_eq!(context.resolve_name("SOL"), "HOH");
    }

    #[test]
    fn unknown_names_pass_through_unclassified() {
        let context = IoContext::new_default();

        assert_eq!(context.resolve_name("LIG"), "LIG");
        assert_eq!(context.classify_residue("LIG"), None);
        assert_eq!(context.classify_residue("ZN"), None);
    }

    #[test]
    fn add_alias_extends_and_overrides_mapping() {
        let mut context = IoContext::default();

        context.add_alias("NLE", "LEU");
        context.add_alias("MSE", "ALA");

        assert_eq!(context.classify_residue("NLE"), Some(StandardResidue::LEU));
        assert_eq!(context.classify_residue("MSE"), Some(StandardResidue::ALA));
    }
}
