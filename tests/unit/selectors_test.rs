// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use pricepulse::engines::parser::{PageParser, SelectorConfig};
    use std::path::PathBuf;

    fn shipped_config() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/selectors.yaml")
    }

    #[test]
    fn test_shipped_selector_file_compiles() {
        let config = SelectorConfig::load(shipped_config()).unwrap();
        assert!(!config.listing.product_card.is_empty());
        assert!(!config.block_markers.is_empty());
        PageParser::new(&config).unwrap();
    }

    #[test]
    fn test_missing_selector_file_falls_back_to_defaults() {
        let config = SelectorConfig::load_or_default(None).unwrap();
        assert_eq!(config.product_id_pattern, SelectorConfig::default().product_id_pattern);
    }

    #[test]
    fn test_recommendation_widgets_are_ignored_on_product_page() {
        let parser = PageParser::new(&SelectorConfig::default()).unwrap();
        let html = r#"
            <html><body>
              <div class="recommendation-box">
                <span class="prc-dsc">19,99 TL</span>
                <div class="social-proof-content">9B kişinin sepetinde</div>
              </div>
              <h1 class="pr-new-br"><a>Marka</a> <span>Asıl Ürün</span></h1>
              <span class="prc-dsc">249,90 TL</span>
              <span class="prc-org">299,90 TL</span>
            </body></html>
        "#;
        let raw = parser.parse_product(html);
        assert_eq!(raw.name.as_deref(), Some("Asıl Ürün"));
        assert_eq!(raw.price_text.as_deref(), Some("249,90 TL"));
        assert_eq!(raw.original_price_text.as_deref(), Some("299,90 TL"));
        assert!(raw.cart_text.is_none());
    }
}
