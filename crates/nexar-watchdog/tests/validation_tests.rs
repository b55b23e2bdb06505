use nexar_test_utils::{Harness, ScriptedRandom};
use nexar_watchdog::{Catalog, CatalogValidator, Category};
use pretty_assertions::assert_eq;

const SPORT: &str = "https://images.pexels.com/photos/595807/pexels-photo-595807.jpeg";
const TOURING: &str = "https://images.pexels.com/photos/2519374/pexels-photo-2519374.jpeg";

fn catalog() -> Catalog {
    Catalog {
        features: ["ABS (sistem antiblocare frâne)", "Parbriz", "Topcase"]
            .into_iter()
            .map(String::from)
            .collect(),
        brands: ["Yamaha", "Honda", "Ducati"].into_iter().map(String::from).collect(),
        categories: [Category::new("Sport", SPORT), Category::new("Touring", TOURING)]
            .into_iter()
            .collect(),
    }
}

fn reported_codes(h: &Harness) -> Vec<String> {
    h.sink
        .records()
        .iter()
        .filter_map(|record| record.full_error.split_whitespace().nth(1).map(String::from))
        .collect()
}

fn setup() -> (Harness, CatalogValidator) {
    let h = Harness::new(ScriptedRandom::new());
    let validator = h.watchdog.validator(catalog());
    (h, validator)
}

#[tokio::test(start_paused = true)]
async fn allowed_data_passes_silently() {
    let (h, validator) = setup();

    assert!(validator.validate_features(&["Parbriz", "Topcase"]));
    assert!(validator.validate_features::<&str>(&[]));
    assert!(validator.validate_brand("Ducati"));
    assert!(validator.validate_category(&Category::new("Sport", SPORT)));
    assert!(validator.validate_categories(&[
        Category::new("Sport", SPORT),
        Category::new("Touring", TOURING),
    ]));
    h.watchdog.settle().await;

    assert!(h.sink.records().is_empty());
    assert!(!h.watchdog.status().unwrap().data_validation_failed);
}

#[tokio::test(start_paused = true)]
async fn unknown_feature_is_reported() {
    let (h, validator) = setup();

    assert!(!validator.validate_features(&["Parbriz", "Jet pack"]));
    h.watchdog.settle().await;

    assert_eq!(reported_codes(&h), vec!["INVALID_FEATURES"]);
    let status = h.watchdog.status().unwrap();
    assert!(status.data_validation_failed);
    assert!(!status.integrity_failed);
    assert!(status.disabled.is_empty());
}

#[tokio::test(start_paused = true)]
async fn brand_rules() {
    let (h, validator) = setup();

    assert!(!validator.validate_brand(""));
    h.watchdog.settle().await;
    assert!(h.sink.records().is_empty());

    assert!(!validator.validate_brand("Vespa"));
    h.watchdog.settle().await;
    assert_eq!(reported_codes(&h), vec!["INVALID_BRAND"]);
}

#[tokio::test(start_paused = true)]
async fn category_image_must_match_name() {
    let (h, validator) = setup();

    assert!(!validator.validate_category(&Category::new("Sport", TOURING)));
    assert!(!validator.validate_category(&Category::new("Sport", "")));
    h.watchdog.settle().await;

    assert_eq!(reported_codes(&h), vec!["INVALID_CATEGORY"]);
}

#[tokio::test(start_paused = true)]
async fn category_list_stops_at_first_rejection() {
    let (h, validator) = setup();

    assert!(!validator.validate_categories(&[
        Category::new("Sport", SPORT),
        Category::new("Naked", SPORT),
        Category::new("Enduro", TOURING),
    ]));
    h.watchdog.settle().await;

    assert_eq!(reported_codes(&h), vec!["INVALID_CATEGORY", "INVALID_CATEGORIES"]);
}

#[tokio::test(start_paused = true)]
async fn malformed_category_in_list_reports_list_only() {
    let (h, validator) = setup();

    assert!(!validator.validate_categories(&[Category::new("", SPORT)]));
    h.watchdog.settle().await;

    assert_eq!(reported_codes(&h), vec!["INVALID_CATEGORIES"]);
}

#[test]
fn catalog_loads_from_toml() {
    let catalog: Catalog = toml::from_str(
        r#"
        brands = ["Yamaha"]

        [[categories]]
        name = "Sport"
        image = "https://images.pexels.com/photos/595807/pexels-photo-595807.jpeg"
        "#,
    )
    .unwrap();

    assert!(catalog.brands.contains("Yamaha"));
    assert!(catalog.features.is_empty());
    assert_eq!(catalog.categories.len(), 1);
}
