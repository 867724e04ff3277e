//! Property cascading logic.

use crate::config::EngineConfig;
use crate::operator::{PropertyMap, camel_to_dash};
use crate::rules::Rule;
use crate::state::{Scalar, State};

/// Cascade a matched rule's properties onto `target`.
///
/// Call in cascade order: later rules override earlier ones. A property whose
/// state key is missing or `Null` cascades as unset.
pub fn cascade_properties(target: &mut PropertyMap, rule: &Rule, state: &State, config: &EngineConfig) {
    for binding in rule.properties() {
        let property = camel_to_dash(&binding.key);
        let value = format_value(state.get(&binding.state_key), &property, config);
        target.insert(binding.key.clone(), value);
    }
}

/// Render a state value for the dash-case `property`.
///
/// Numbers get the configured unit unless the property is unitless.
pub fn format_value(value: Option<&Scalar>, property: &str, config: &EngineConfig) -> Option<String> {
    let value = value?;
    let text = value.render()?;
    match value {
        Scalar::Number(_) if !config.is_unitless(property) => {
            Some(format!("{}{}", text, config.numeric_unit))
        }
        _ => Some(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::PropertyBinding;
    use crate::template::SelectorTemplate;

    fn rule(bindings: &[(&str, &str, &str)]) -> Rule {
        Rule::new(
            SelectorTemplate::parse("div"),
            bindings
                .iter()
                .map(|(property, key, state_key)| PropertyBinding::new(*property, *key, *state_key))
                .collect(),
            0,
        )
    }

    #[test]
    fn format_values() {
        let config = EngineConfig::default();
        let number = Scalar::from(100);
        assert_eq!(format_value(Some(&number), "max-width", &config).as_deref(), Some("100px"));
        assert_eq!(format_value(Some(&number), "z-index", &config).as_deref(), Some("100"));
        assert_eq!(
            format_value(Some(&Scalar::from(0.5)), "opacity", &config).as_deref(),
            Some("0.5")
        );
        assert_eq!(
            format_value(Some(&Scalar::from("50%")), "width", &config).as_deref(),
            Some("50%")
        );
        assert_eq!(format_value(Some(&Scalar::Null), "width", &config), None);
        assert_eq!(format_value(None, "width", &config), None);

        let config = EngineConfig::default().with_numeric_unit("");
        assert_eq!(format_value(Some(&number), "width", &config).as_deref(), Some("100"));
    }

    #[test]
    fn later_rules_override() {
        let config = EngineConfig::default();
        let state = State::new().with("w", 10).with("c", "red").with("c2", "blue");

        let mut target = PropertyMap::new();
        cascade_properties(&mut target, &rule(&[("width", "width", "w"), ("color", "color", "c")]), &state, &config);
        cascade_properties(&mut target, &rule(&[("color", "color", "c2")]), &state, &config);

        assert_eq!(target.get("width"), Some(&Some("10px".to_string())));
        assert_eq!(target.get("color"), Some(&Some("blue".to_string())));
    }

    #[test]
    fn missing_values_cascade_as_unset() {
        let config = EngineConfig::default();
        let state = State::new().with("c", "red");

        let mut target = PropertyMap::new();
        cascade_properties(&mut target, &rule(&[("color", "color", "c")]), &state, &config);
        cascade_properties(&mut target, &rule(&[("color", "color", "missing")]), &state, &config);

        assert_eq!(target.get("color"), Some(&None));
    }

    #[test]
    fn unitless_lookup_ignores_spelling() {
        let config = EngineConfig::default();
        let state = State::new().with("layer", 3).with("fade", 0.5).with("w", 4);

        let mut target = PropertyMap::new();
        cascade_properties(
            &mut target,
            &rule(&[
                ("zIndex", "zIndex", "layer"),
                ("opacity", "opacity", "fade"),
                ("maxWidth", "maxWidth", "w"),
            ]),
            &state,
            &config,
        );

        assert_eq!(target.get("zIndex"), Some(&Some("3".to_string())));
        assert_eq!(target.get("opacity"), Some(&Some("0.5".to_string())));
        assert_eq!(target.get("maxWidth"), Some(&Some("4px".to_string())));
    }
}
