//! Test suite data model
//!
//! Everything here is built once at load time and only handed out by shared
//! reference afterwards. Entities with cross-field invariants go through
//! validated constructors, so a value that exists is a value that is valid.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult};

const DEFAULT_FIRST_NAME: &str = "John";
const DEFAULT_LAST_NAME: &str = "Doe";
const DEFAULT_POSTAL_CODE: &str = "12345";
const DEFAULT_URL_FRAGMENT: &str = "/inventory.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedResult {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// An item to put in the cart together with the price the UI must show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub name: String,
    pub expected_price: Decimal,
}

/// Checkout form values. A missing field falls back to a default, a present
/// but empty field is submitted empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutInfo {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl CheckoutInfo {
    pub fn first_name(&self) -> &str {
        self.first_name.as_deref().unwrap_or(DEFAULT_FIRST_NAME)
    }

    pub fn last_name(&self) -> &str {
        self.last_name.as_deref().unwrap_or(DEFAULT_LAST_NAME)
    }

    pub fn postal_code(&self) -> &str {
        self.postal_code.as_deref().unwrap_or(DEFAULT_POSTAL_CODE)
    }
}

/// Optional extra checks run after a successful login
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalValidations {
    #[serde(default)]
    pub check_inventory_count: bool,
    #[serde(default)]
    pub check_cart_empty: bool,
    #[serde(default)]
    pub check_menu_visible: bool,
    #[serde(default)]
    pub check_nonexistent_element: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCase {
    pub name: String,
    pub credentials: Credentials,
    pub items: Vec<CartItem>,
    pub expected_result: ExpectedResult,
    pub expected_error_message: Option<String>,
    pub expected_url_fragment: Option<String>,
    pub max_response_time_ms: Option<u64>,
    pub additional_validations: Option<AdditionalValidations>,
    pub checkout_info: Option<CheckoutInfo>,
}

impl TestCase {
    pub fn expects_success(&self) -> bool {
        self.expected_result == ExpectedResult::Success
    }

    pub fn url_fragment(&self) -> &str {
        self.expected_url_fragment
            .as_deref()
            .unwrap_or(DEFAULT_URL_FRAGMENT)
    }

    pub fn checkout(&self) -> CheckoutInfo {
        self.checkout_info.clone().unwrap_or_default()
    }

    fn validate(&self) -> HarnessResult<()> {
        if self.name.trim().is_empty() {
            return Err(HarnessError::config("test case name must not be empty"));
        }
        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(HarnessError::config(format!(
                    "test case '{}': item name must not be empty",
                    self.name
                )));
            }
            if item.expected_price < Decimal::ZERO {
                return Err(HarnessError::config(format!(
                    "test case '{}': price {} for '{}' is negative",
                    self.name, item.expected_price, item.name
                )));
            }
        }
        Ok(())
    }
}

/// Ordered, validated list of cases sharing one theme
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestSuite {
    name: String,
    cases: Vec<TestCase>,
}

impl TestSuite {
    /// Build a suite, rejecting it as a whole if any case is invalid
    pub fn new(name: impl Into<String>, cases: Vec<TestCase>) -> HarnessResult<Self> {
        let name = name.into();
        let mut seen = HashSet::new();
        for case in &cases {
            case.validate()
                .map_err(|e| HarnessError::config(format!("suite '{}': {}", name, e)))?;
            if !seen.insert(case.name.as_str()) {
                return Err(HarnessError::config(format!(
                    "suite '{}': duplicate test case name '{}'",
                    name, case.name
                )));
            }
        }
        Ok(Self { name, cases })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Allowed ranges for product price and description length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawValidationRules")]
pub struct ValidationRules {
    min_price: Decimal,
    max_price: Decimal,
    min_description_length: usize,
    max_description_length: usize,
}

#[derive(Debug, Deserialize)]
struct RawValidationRules {
    min_price: Decimal,
    max_price: Decimal,
    min_description_length: usize,
    max_description_length: usize,
}

impl ValidationRules {
    pub fn new(
        min_price: Decimal,
        max_price: Decimal,
        min_description_length: usize,
        max_description_length: usize,
    ) -> HarnessResult<Self> {
        if min_price < Decimal::ZERO {
            return Err(HarnessError::config("min_price must not be negative"));
        }
        if max_price <= min_price {
            return Err(HarnessError::config("max_price must be greater than min_price"));
        }
        if max_description_length <= min_description_length {
            return Err(HarnessError::config(
                "max_description_length must be greater than min_description_length",
            ));
        }
        Ok(Self {
            min_price,
            max_price,
            min_description_length,
            max_description_length,
        })
    }

    pub fn min_price(&self) -> Decimal {
        self.min_price
    }

    pub fn max_price(&self) -> Decimal {
        self.max_price
    }

    pub fn min_description_length(&self) -> usize {
        self.min_description_length
    }

    pub fn max_description_length(&self) -> usize {
        self.max_description_length
    }

    pub fn price_in_range(&self, price: Decimal) -> bool {
        price >= self.min_price && price <= self.max_price
    }

    pub fn description_in_range(&self, description: &str) -> bool {
        let len = description.chars().count();
        len >= self.min_description_length && len <= self.max_description_length
    }
}

impl TryFrom<RawValidationRules> for ValidationRules {
    type Error = HarnessError;

    fn try_from(raw: RawValidationRules) -> HarnessResult<Self> {
        Self::new(
            raw.min_price,
            raw.max_price,
            raw.min_description_length,
            raw.max_description_length,
        )
    }
}

/// The product the search workflow looks for, checked against its rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawProductExpectation")]
pub struct ProductExpectation {
    name: String,
    expected_price: Decimal,
    expected_description: String,
    validation_rules: ValidationRules,
}

#[derive(Debug, Deserialize)]
struct RawProductExpectation {
    name: String,
    expected_price: Decimal,
    expected_description: String,
    validation_rules: ValidationRules,
}

impl ProductExpectation {
    pub fn new(
        name: impl Into<String>,
        expected_price: Decimal,
        expected_description: impl Into<String>,
        validation_rules: ValidationRules,
    ) -> HarnessResult<Self> {
        let name = name.into();
        let expected_description = expected_description.into();

        if name.is_empty() {
            return Err(HarnessError::config("product name must not be empty"));
        }
        if expected_description.is_empty() {
            return Err(HarnessError::config("expected description must not be empty"));
        }
        if expected_price < Decimal::ZERO {
            return Err(HarnessError::config("expected price must not be negative"));
        }
        if !validation_rules.price_in_range(expected_price) {
            return Err(HarnessError::config(format!(
                "Price {} must be between {} and {}",
                expected_price,
                validation_rules.min_price(),
                validation_rules.max_price()
            )));
        }
        if !validation_rules.description_in_range(&expected_description) {
            return Err(HarnessError::config(format!(
                "Description length must be between {} and {} characters",
                validation_rules.min_description_length(),
                validation_rules.max_description_length()
            )));
        }

        Ok(Self {
            name,
            expected_price,
            expected_description,
            validation_rules,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn expected_price(&self) -> Decimal {
        self.expected_price
    }

    pub fn expected_description(&self) -> &str {
        &self.expected_description
    }

    pub fn validation_rules(&self) -> &ValidationRules {
        &self.validation_rules
    }
}

impl TryFrom<RawProductExpectation> for ProductExpectation {
    type Error = HarnessError;

    fn try_from(raw: RawProductExpectation) -> HarnessResult<Self> {
        Self::new(
            raw.name,
            raw.expected_price,
            raw.expected_description,
            raw.validation_rules,
        )
    }
}

/// Top-level product search document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSearchConfig {
    pub product_search: ProductExpectation,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn rules() -> ValidationRules {
        ValidationRules::new(dec!(0), dec!(100), 10, 500).unwrap()
    }

    #[test_case(dec!(10), dec!(10), 1, 5 ; "equal prices")]
    #[test_case(dec!(10), dec!(5), 1, 5 ; "inverted prices")]
    #[test_case(dec!(0), dec!(10), 5, 5 ; "equal lengths")]
    #[test_case(dec!(0), dec!(10), 6, 5 ; "inverted lengths")]
    #[test_case(dec!(-1), dec!(10), 0, 5 ; "negative min price")]
    fn rules_reject_invalid_ranges(min: Decimal, max: Decimal, min_len: usize, max_len: usize) {
        let err = ValidationRules::new(min, max, min_len, max_len).unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)));
    }

    #[test]
    fn rules_accept_valid_ranges() {
        let rules = ValidationRules::new(dec!(0), dec!(0.01), 0, 1).unwrap();
        assert!(rules.price_in_range(dec!(0)));
        assert!(rules.price_in_range(dec!(0.01)));
        assert!(!rules.price_in_range(dec!(0.02)));
    }

    #[test_case(dec!(100.01) ; "above max")]
    #[test_case(dec!(-0.01) ; "negative")]
    fn product_rejects_price_out_of_range(price: Decimal) {
        let description = "carry.allTheThings() with the sleek backpack";
        assert!(ProductExpectation::new("Sauce Labs Backpack", price, description, rules()).is_err());
    }

    #[test]
    fn product_rejects_description_out_of_range() {
        assert!(ProductExpectation::new("Backpack", dec!(29.99), "too short", rules()).is_err());
        let long = "x".repeat(501);
        assert!(ProductExpectation::new("Backpack", dec!(29.99), long, rules()).is_err());
    }

    #[test]
    fn product_accepts_bounds_inclusive() {
        let exact_min = "y".repeat(10);
        let product = ProductExpectation::new("Backpack", dec!(100), exact_min, rules()).unwrap();
        assert_eq!(product.expected_price(), dec!(100));
        assert_eq!(product.validation_rules().max_description_length(), 500);
    }

    #[test]
    fn product_search_document_is_validated_on_parse() {
        let json = r#"{
            "product_search": {
                "name": "Sauce Labs Backpack",
                "expected_price": 29.99,
                "expected_description": "carry.allTheThings() with the sleek, streamlined Sly Pack",
                "validation_rules": {
                    "min_price": 0,
                    "max_price": 20,
                    "min_description_length": 10,
                    "max_description_length": 500
                }
            }
        }"#;
        let err = serde_json::from_str::<ProductSearchConfig>(json).unwrap_err();
        assert!(err.to_string().contains("Price 29.99 must be between 0 and 20"));
    }

    #[test]
    fn suite_rejects_duplicate_names() {
        let case = TestCase {
            name: "standard".into(),
            credentials: Credentials {
                username: "standard_user".into(),
                password: "secret_sauce".into(),
            },
            items: vec![],
            expected_result: ExpectedResult::Success,
            expected_error_message: None,
            expected_url_fragment: None,
            max_response_time_ms: None,
            additional_validations: None,
            checkout_info: None,
        };
        let err = TestSuite::new("login", vec![case.clone(), case]).unwrap_err();
        assert!(err.to_string().contains("duplicate test case name 'standard'"));
    }

    #[test]
    fn checkout_info_defaults_only_missing_fields() {
        let info = CheckoutInfo {
            first_name: None,
            last_name: Some("Smith".into()),
            postal_code: Some(String::new()),
        };
        assert_eq!(info.first_name(), "John");
        assert_eq!(info.last_name(), "Smith");
        assert_eq!(info.postal_code(), "");
    }
}
