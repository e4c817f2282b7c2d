pub const SNYK_TOKEN: &str = "SNYK_TOKEN";
pub const SNYK_ORG_ID: &str = "SNYK_ORG_ID";

/// Reads `key` from the process environment. Unset and empty values are both `None`.
pub fn load_env(key: &str) -> Option<String> {
    non_empty(std::env::var(key).ok())
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|x| !x.trim().is_empty())
}
