//! Static legal pages.

const TERMS: &str = include_str!("../assets/terms.md");
const PRIVACY: &str = include_str!("../assets/privacy.md");

pub async fn terms() -> &'static str {
    TERMS
}

pub async fn privacy() -> &'static str {
    PRIVACY
}
