use cruet::{
    case::{
        camel::to_camel_case, kebab::to_kebab_case, pascal::to_pascal_case,
        screaming_snake::to_screaming_snake_case, snake::to_snake_case,
    },
    string::{pluralize::to_plural, singularize::to_singular},
};
use log::warn;
use minijinja::Environment;
use regex::Regex;

/// Registers the view filters on `env`.
pub fn register_filters(env: &mut Environment<'_>) {
    env.add_filter("camel_case", to_camel_case);
    env.add_filter("kebab_case", to_kebab_case);
    env.add_filter("pascal_case", to_pascal_case);
    env.add_filter("snake_case", to_snake_case);
    env.add_filter("screaming_snake_case", to_screaming_snake_case);
    env.add_filter("plural", to_plural);
    env.add_filter("singular", to_singular);
    env.add_filter("regex", regex_filter);
}

/// Tests `val` against the pattern `re`. Invalid patterns never match.
pub fn regex_filter(val: &str, re: &str) -> bool {
    match Regex::new(re) {
        Ok(re) => re.is_match(val),
        Err(err) => {
            warn!("Invalid regex '{re}' in template: {err}");
            false
        }
    }
}
