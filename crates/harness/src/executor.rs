//! Scripted interactions against the storefront
//!
//! Each case walks `Pending → Navigating → Authenticating → Acting →
//! Verifying → Passed`. The first error moves it to `Failed` and comes back as
//! a [`CaseFailure`] naming the case, the step and the state it was in.

use std::future::Future;

use rust_decimal::Decimal;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::artifacts::{ArtifactStore, ProductRecord};
use crate::assertions::{
    assert_at_least, assert_cart_total, assert_count, assert_error_shown,
    assert_normalized_contains, assert_not_visible, assert_price_eq, assert_response_time,
    assert_text_contains, assert_text_eq, assert_visible, parse_price, response_threshold,
};
use crate::config::HarnessConfig;
use crate::driver::{Driver, LoadState, Locator, UrlPattern, WaitState};
use crate::error::{HarnessError, HarnessResult};
use crate::model::{AdditionalValidations, CartItem, Credentials, ProductExpectation, TestCase};

/// Storefront element selectors
pub mod selectors {
    pub const USERNAME: &str = "#user-name";
    pub const PASSWORD: &str = "#password";
    pub const LOGIN_BUTTON: &str = "#login-button";
    pub const ERROR_MESSAGE: &str = "[data-test=\"error\"]";

    pub const INVENTORY_ITEM: &str = ".inventory_item";
    pub const ITEM_NAME: &str = ".inventory_item_name";
    pub const ITEM_DESCRIPTION: &str = ".inventory_item_desc";
    pub const ITEM_PRICE: &str = ".inventory_item_price";
    pub const ITEM_IMAGE: &str = "img.inventory_item_img";
    pub const ADD_TO_CART: &str = ".btn_inventory";
    pub const DETAILS_DESCRIPTION: &str = ".inventory_details_desc";

    pub const CART_BADGE: &str = ".shopping_cart_badge";
    pub const CART_LINK: &str = ".shopping_cart_link";
    pub const CART_ITEM: &str = ".cart_item";
    pub const MENU_BUTTON: &str = "#react-burger-menu-btn";
    pub const NONEXISTENT: &str = "#this-element-does-not-exist";

    pub const CHECKOUT: &str = "#checkout";
    pub const FIRST_NAME: &str = "#first-name";
    pub const LAST_NAME: &str = "#last-name";
    pub const POSTAL_CODE: &str = "#postal-code";
    pub const CONTINUE: &str = "#continue";
    pub const FINISH: &str = "#finish";
    pub const SUMMARY_SUBTOTAL: &str = ".summary_subtotal_label";
    pub const COMPLETE_HEADER: &str = ".complete-header";
}

use selectors::*;

const INVENTORY_PATH: &str = "/inventory.html";
const DETAILS_URL_GLOB: &str = "**/inventory-item.html*";
const OVERVIEW_PATH: &str = "/checkout-step-two.html";
const COMPLETE_PATH: &str = "/checkout-complete.html";
const COMPLETION_MESSAGE: &str = "THANK YOU FOR YOUR ORDER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseState {
    Pending,
    Navigating,
    Authenticating,
    Acting,
    Verifying,
    Passed,
    Failed,
}

impl CaseState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CaseState::Passed | CaseState::Failed)
    }

    /// Forward-only transitions. Login cases go straight from
    /// authentication to verification.
    pub fn can_transition_to(self, next: CaseState) -> bool {
        use CaseState::*;
        match (self, next) {
            (Passed | Failed, _) => false,
            (_, Failed) => true,
            (Pending, Navigating)
            | (Navigating, Authenticating)
            | (Authenticating, Acting)
            | (Authenticating, Verifying)
            | (Acting, Verifying)
            | (Verifying, Passed) => true,
            _ => false,
        }
    }
}

/// A case that ended in `Failed`
#[derive(Debug)]
pub struct CaseFailure {
    pub case: String,
    pub step: String,
    /// State the case was in when the step failed
    pub state: CaseState,
    pub error: HarnessError,
}

impl CaseFailure {
    pub fn into_error(self) -> HarnessError {
        HarnessError::CaseFailed {
            case: self.case,
            step: self.step,
            source: Box::new(self.error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub case: String,
    pub state: CaseState,
    pub duration_ms: u64,
    pub response_time_ms: Option<u64>,
    pub cart_total: Option<Decimal>,
    pub checkout_completed: Option<bool>,
}

/// Tracks one case through its state machine
struct CaseRun {
    case: String,
    state: CaseState,
    step: &'static str,
    started: Instant,
}

impl CaseRun {
    fn start(case: &str) -> Self {
        Self {
            case: case.to_string(),
            state: CaseState::Pending,
            step: "start",
            started: Instant::now(),
        }
    }

    fn enter(&mut self, next: CaseState) -> Result<(), CaseFailure> {
        if !self.state.can_transition_to(next) {
            let err = HarnessError::assertion(format!(
                "invalid case state transition {:?} -> {:?}",
                self.state, next
            ));
            return Err(self.fail(err));
        }
        debug!("{}: {:?} -> {:?}", self.case, self.state, next);
        self.state = next;
        Ok(())
    }

    async fn step<T, Fut>(&mut self, name: &'static str, fut: Fut) -> Result<T, CaseFailure>
    where
        Fut: Future<Output = HarnessResult<T>>,
    {
        self.step = name;
        debug!("{}: step {}", self.case, name);
        fut.await.map_err(|e| self.fail(e))
    }

    fn check<T>(&mut self, name: &'static str, result: HarnessResult<T>) -> Result<T, CaseFailure> {
        self.step = name;
        result.map_err(|e| self.fail(e))
    }

    fn fail(&mut self, error: HarnessError) -> CaseFailure {
        let state = self.state;
        self.state = CaseState::Failed;
        error!("Test failed: {} (case: {}, step: {})", error, self.case, self.step);
        CaseFailure {
            case: self.case.clone(),
            step: self.step.to_string(),
            state,
            error,
        }
    }

    fn finish(mut self) -> Result<CaseReport, CaseFailure> {
        self.enter(CaseState::Passed)?;
        info!("Test case completed: {}", self.case);
        Ok(CaseReport {
            case: self.case,
            state: self.state,
            duration_ms: self.started.elapsed().as_millis() as u64,
            response_time_ms: None,
            cart_total: None,
            checkout_completed: None,
        })
    }
}

/// Replays case scripts through a [`Driver`]
pub struct InteractionExecutor<'a> {
    config: &'a HarnessConfig,
    artifacts: &'a ArtifactStore,
}

impl<'a> InteractionExecutor<'a> {
    pub fn new(config: &'a HarnessConfig, artifacts: &'a ArtifactStore) -> Self {
        Self { config, artifacts }
    }

    /// Open the application entry point
    pub async fn navigate(&self, driver: &mut dyn Driver) -> HarnessResult<()> {
        info!("Navigating to website");
        driver
            .goto(&self.config.app.base_url, self.config.timeouts.navigation())
            .await
    }

    /// Fill the login form and submit it
    pub async fn authenticate(&self, driver: &mut dyn Driver, credentials: &Credentials) -> HarnessResult<()> {
        let element = self.config.timeouts.element();
        info!("Filling login form");
        driver
            .fill(&Locator::css(USERNAME), &credentials.username, element)
            .await?;
        driver
            .fill(&Locator::css(PASSWORD), &credentials.password, element)
            .await?;
        info!("Clicking login button");
        driver.click(&Locator::css(LOGIN_BUTTON), element).await
    }

    /// Wait for the network to go idle; returns how long that took
    pub async fn settle(&self, driver: &mut dyn Driver) -> HarnessResult<u64> {
        let start = Instant::now();
        driver
            .wait_for_load_state(LoadState::NetworkIdle, self.config.timeouts.load_state())
            .await?;
        Ok(start.elapsed().as_millis() as u64)
    }

    pub async fn run_login_case(&self, driver: &mut dyn Driver, case: &TestCase) -> Result<CaseReport, CaseFailure> {
        let mut run = CaseRun::start(&case.name);
        info!("Starting test case: {}", case.name);
        info!("Username: {}", case.credentials.username);

        run.enter(CaseState::Navigating)?;
        run.step("navigate", self.navigate(driver)).await?;

        run.enter(CaseState::Authenticating)?;
        run.step("authenticate", self.authenticate(driver, &case.credentials))
            .await?;
        let response_ms = run.step("wait_for_page_load", self.settle(driver)).await?;
        info!("Response time: {} ms", response_ms);
        let threshold = response_threshold(
            case.max_response_time_ms,
            self.config.threshold_for_user(&case.credentials.username),
        );
        info!("Checking response time against threshold: {} ms", threshold);
        run.check("check_response_time", assert_response_time(response_ms, threshold))?;

        run.enter(CaseState::Verifying)?;
        if case.expects_success() {
            run.step("verify_logged_in", self.verify_logged_in(driver, case))
                .await?;
            if let Some(validations) = &case.additional_validations {
                run.step(
                    "additional_validations",
                    self.additional_validations(driver, validations),
                )
                .await?;
            }
        } else {
            let message = run
                .step(
                    "verify_error_message",
                    self.verify_error_shown(driver, case.expected_error_message.as_deref()),
                )
                .await?;
            info!("Received error message: {}", message);
        }

        let mut report = run.finish()?;
        report.response_time_ms = Some(response_ms);
        Ok(report)
    }

    async fn verify_logged_in(&self, driver: &mut dyn Driver, case: &TestCase) -> HarnessResult<()> {
        let url = driver.current_url().await?;
        if !url.contains(case.url_fragment()) {
            return Err(HarnessError::assertion(format!(
                "Failed to reach inventory page: expected url containing '{}', got '{}'",
                case.url_fragment(),
                url
            )));
        }
        info!("Successfully logged in as {}", case.credentials.username);

        let items = driver.count(&Locator::css(INVENTORY_ITEM)).await?;
        assert_count("Inventory", self.config.app.inventory_size, items)?;
        info!("Verified inventory contains {} items", items);

        let badge = driver.is_visible(&Locator::css(CART_BADGE)).await?;
        assert_not_visible("Cart badge", badge)?;
        info!("Verified cart is empty");

        let menu = driver.is_visible(&Locator::css(MENU_BUTTON)).await?;
        assert_visible("Menu button", menu)?;
        info!("Verified menu button is visible");
        Ok(())
    }

    async fn additional_validations(
        &self,
        driver: &mut dyn Driver,
        validations: &AdditionalValidations,
    ) -> HarnessResult<()> {
        if validations.check_inventory_count {
            let items = driver.count(&Locator::css(INVENTORY_ITEM)).await?;
            assert_at_least("Inventory", 1, items)?;
        }
        if validations.check_cart_empty {
            let badge = driver.is_visible(&Locator::css(CART_BADGE)).await?;
            assert_not_visible("Cart badge", badge)?;
        }
        if validations.check_menu_visible {
            let menu = driver.is_visible(&Locator::css(MENU_BUTTON)).await?;
            assert_visible("Menu button", menu)?;
        }
        if validations.check_nonexistent_element {
            let ghost = driver.is_visible(&Locator::css(NONEXISTENT)).await?;
            assert_not_visible("Nonexistent element", ghost)?;
        }
        Ok(())
    }

    /// The error indicator must be shown, containing `expected` when given
    pub async fn verify_error_shown(&self, driver: &mut dyn Driver, expected: Option<&str>) -> HarnessResult<String> {
        let indicator = Locator::css(ERROR_MESSAGE);
        let visible = driver.is_visible(&indicator).await?;
        let message = if visible {
            driver.text_content(&indicator).await?
        } else {
            None
        };
        assert_error_shown(visible, message.as_deref(), expected)
    }

    pub async fn run_cart_case(&self, driver: &mut dyn Driver, case: &TestCase) -> Result<CaseReport, CaseFailure> {
        let mut run = CaseRun::start(&case.name);
        info!("Starting test case: {}", case.name);

        run.enter(CaseState::Navigating)?;
        run.step("navigate", self.navigate(driver)).await?;

        run.enter(CaseState::Authenticating)?;
        run.step("authenticate", self.authenticate(driver, &case.credentials))
            .await?;
        let response_ms = run.step("wait_for_page_load", self.settle(driver)).await?;
        if let Some(threshold) = case.max_response_time_ms {
            run.check("check_response_time", assert_response_time(response_ms, threshold))?;
        }

        run.enter(CaseState::Acting)?;
        info!("Adding items to cart");
        let total = run
            .step("add_items_to_cart", self.add_items_to_cart(driver, &case.items))
            .await?;
        info!("Total price: ${}", total);
        run.step("open_cart", self.open_cart(driver)).await?;
        run.step("verify_cart", self.verify_cart(driver, case.items.len(), total))
            .await?;
        info!("Starting checkout process");
        let completed = run
            .step("checkout", self.checkout(driver, case, total))
            .await?;

        run.enter(CaseState::Verifying)?;
        if case.expects_success() && !completed {
            run.check::<()>(
                "verify_checkout_outcome",
                Err(HarnessError::assertion("Checkout should succeed")),
            )?;
        }
        if !case.expects_success() && completed {
            run.check::<()>(
                "verify_checkout_outcome",
                Err(HarnessError::ExpectedErrorNotShown {
                    expected: case.expected_error_message.clone(),
                }),
            )?;
        }

        let mut report = run.finish()?;
        report.response_time_ms = Some(response_ms);
        report.cart_total = Some(total);
        report.checkout_completed = Some(completed);
        Ok(report)
    }

    /// Add every item, checking its listed price first. Returns the exact sum.
    ///
    /// A price mismatch is raised before the item is added.
    pub async fn add_items_to_cart(&self, driver: &mut dyn Driver, items: &[CartItem]) -> HarnessResult<Decimal> {
        let element = self.config.timeouts.element();
        let mut total = Decimal::ZERO;

        for item in items {
            let container = Locator::has_text(INVENTORY_ITEM, ITEM_NAME, &item.name).first();
            if driver.count(&container).await? == 0 {
                return Err(HarnessError::assertion(format!("Item not found: {}", item.name)));
            }

            let price_text = driver
                .text_content(&container.child(ITEM_PRICE))
                .await?
                .ok_or_else(|| HarnessError::assertion(format!("No price shown for {}", item.name)))?;
            let actual = parse_price(&price_text)?;

            if let Err(e) = assert_price_eq(&item.name, item.expected_price, actual) {
                error!("{}", e);
                self.artifacts
                    .log_validation_error("price_verification", &e.to_string())?;
                return Err(e);
            }

            driver.click(&container.child(ADD_TO_CART), element).await?;
            total += actual;

            // cart badge updates asynchronously
            tokio::time::sleep(self.config.timeouts.settle()).await;
        }

        Ok(total)
    }

    pub async fn open_cart(&self, driver: &mut dyn Driver) -> HarnessResult<()> {
        driver
            .click(&Locator::css(CART_LINK), self.config.timeouts.element())
            .await?;
        self.settle(driver).await?;
        Ok(())
    }

    /// Check line count and price sum on the cart page, plus the subtotal
    /// label when on the checkout overview.
    pub async fn verify_cart(
        &self,
        driver: &mut dyn Driver,
        expected_count: usize,
        expected_total: Decimal,
    ) -> HarnessResult<()> {
        let lines = driver.count(&Locator::css(CART_ITEM)).await?;
        assert_count("Cart", expected_count, lines)?;
        info!("Verified cart contains {} items", lines);

        let mut sum = Decimal::ZERO;
        for i in 0..lines {
            let price = Locator::css(CART_ITEM).nth(i).child(ITEM_PRICE);
            let text = driver
                .text_content(&price)
                .await?
                .ok_or_else(|| HarnessError::assertion(format!("Cart line {} has no price", i + 1)))?;
            sum += parse_price(&text)?;
        }
        assert_cart_total("Cart total", expected_total, sum)?;
        info!("Verified cart total price: ${}", sum);

        if driver.current_url().await?.ends_with(OVERVIEW_PATH) {
            let text = driver
                .text_content(&Locator::css(SUMMARY_SUBTOTAL))
                .await?
                .ok_or_else(|| HarnessError::assertion("Summary subtotal is missing"))?;
            let subtotal = parse_price(&text)?;
            assert_cart_total("Summary subtotal", expected_total, subtotal)?;
            info!("Verified summary subtotal: ${}", subtotal);
        }
        Ok(())
    }

    /// Run checkout from the cart page.
    ///
    /// Returns `Ok(false)` when the form was rejected and the case expected
    /// that, `Ok(true)` when the order completed.
    pub async fn checkout(&self, driver: &mut dyn Driver, case: &TestCase, total: Decimal) -> HarnessResult<bool> {
        let element = self.config.timeouts.element();
        let info = case.checkout();

        driver.click(&Locator::css(CHECKOUT), element).await?;
        driver
            .fill(&Locator::css(FIRST_NAME), info.first_name(), element)
            .await?;
        driver
            .fill(&Locator::css(LAST_NAME), info.last_name(), element)
            .await?;
        driver
            .fill(&Locator::css(POSTAL_CODE), info.postal_code(), element)
            .await?;
        driver.click(&Locator::css(CONTINUE), element).await?;

        let indicator = Locator::css(ERROR_MESSAGE);
        if driver.is_visible(&indicator).await? {
            let message = driver.text_content(&indicator).await?.unwrap_or_default();
            warn!("Checkout error: {}", message);
            self.artifacts.log_validation_error(&case.name, &message)?;

            if case.expects_success() {
                return Err(HarnessError::assertion(format!(
                    "Unexpected checkout error: {}",
                    message
                )));
            }
            if let Some(expected) = &case.expected_error_message {
                assert_text_contains(expected, &message)?;
            }
            return Ok(false);
        }

        self.verify_cart(driver, case.items.len(), total).await?;

        driver.click(&Locator::css(FINISH), element).await?;
        driver
            .wait_for_url(&UrlPattern::EndsWith(COMPLETE_PATH.to_string()), element)
            .await?;
        let header = Locator::css(COMPLETE_HEADER);
        driver
            .wait_for(&header, WaitState::Visible, self.config.timeouts.completion())
            .await?;

        let header_text = driver.text_content(&header).await?.unwrap_or_default();
        info!("Complete header text: '{}'", header_text);

        if case.expects_success() {
            let visible = driver.is_visible(&header).await?;
            assert_visible("Completion header", visible)?;
            assert_normalized_contains(COMPLETION_MESSAGE, &header_text)?;
        }
        Ok(true)
    }

    /// Search workflow: log in, find the product, verify price and details
    pub async fn run_product_search(
        &self,
        driver: &mut dyn Driver,
        credentials: &Credentials,
        product: &ProductExpectation,
    ) -> Result<CaseReport, CaseFailure> {
        let mut run = CaseRun::start("product_search");

        run.enter(CaseState::Navigating)?;
        run.step("navigate", self.navigate(driver)).await?;

        run.enter(CaseState::Authenticating)?;
        run.step("authenticate", self.authenticate(driver, credentials))
            .await?;
        run.step(
            "wait_for_inventory",
            driver.wait_for(
                &Locator::css(INVENTORY_ITEM).first(),
                WaitState::Visible,
                self.config.timeouts.element(),
            ),
        )
        .await?;
        info!("Login successful");

        run.enter(CaseState::Acting)?;
        let item = run
            .step("find_product", self.find_product(driver, product.name()))
            .await?;

        run.enter(CaseState::Verifying)?;
        run.step(
            "verify_product_details",
            self.verify_product_details(driver, &item, product),
        )
        .await?;

        run.finish()
    }

    /// Locate an inventory item by its exact (trimmed) name
    pub async fn find_product(&self, driver: &mut dyn Driver, name: &str) -> HarnessResult<Locator> {
        info!("Searching for product: {}", name);
        let items = Locator::css(INVENTORY_ITEM);
        driver
            .wait_for(&items.clone().first(), WaitState::Visible, self.config.timeouts.element())
            .await?;

        let count = driver.count(&items).await?;
        for i in 0..count {
            let item = items.clone().nth(i);
            let current = driver
                .text_content(&item.child(ITEM_NAME))
                .await?
                .unwrap_or_default();
            if current.trim() == name {
                info!("Product found: {}", name);
                return Ok(item);
            }
        }
        Err(HarnessError::assertion(format!("Product '{}' not found", name)))
    }

    /// Exact price on the listing, then exact description on the detail page
    pub async fn verify_product_details(
        &self,
        driver: &mut dyn Driver,
        item: &Locator,
        product: &ProductExpectation,
    ) -> HarnessResult<()> {
        let element = self.config.timeouts.element();

        let price_text = driver
            .text_content(&item.child(ITEM_PRICE))
            .await?
            .ok_or_else(|| HarnessError::assertion(format!("No price shown for {}", product.name())))?;
        assert_price_eq(product.name(), product.expected_price(), parse_price(&price_text)?)?;

        info!("Clicking product to view details");
        driver.click(&item.child(ITEM_NAME), element).await?;
        driver
            .wait_for_url(&UrlPattern::Glob(DETAILS_URL_GLOB.to_string()), element)
            .await?;
        let description = Locator::css(DETAILS_DESCRIPTION);
        driver
            .wait_for(&description, WaitState::Visible, element)
            .await?;

        let actual = driver.text_content(&description).await?.unwrap_or_default();
        assert_text_eq(product.expected_description(), &actual)?;
        info!("Product details verified successfully");
        Ok(())
    }

    /// Log in and read every inventory item for the product export
    pub async fn run_product_scrape(
        &self,
        driver: &mut dyn Driver,
        credentials: &Credentials,
    ) -> Result<(CaseReport, Vec<ProductRecord>), CaseFailure> {
        let mut run = CaseRun::start("product_data");

        run.enter(CaseState::Navigating)?;
        run.step("navigate", self.navigate(driver)).await?;

        run.enter(CaseState::Authenticating)?;
        run.step("authenticate", self.authenticate(driver, credentials))
            .await?;
        info!("Waiting for inventory page to load");
        run.step("wait_for_page_load", self.settle(driver)).await?;

        run.enter(CaseState::Acting)?;
        info!("Collecting product data");
        let products = run
            .step("collect_products", self.collect_products(driver))
            .await?;

        run.enter(CaseState::Verifying)?;
        run.check(
            "verify_products",
            assert_at_least("Inventory", 1, products.len()),
        )?;

        Ok((run.finish()?, products))
    }

    async fn collect_products(&self, driver: &mut dyn Driver) -> HarnessResult<Vec<ProductRecord>> {
        let url = driver.current_url().await?;
        if !url.contains(INVENTORY_PATH) {
            return Err(HarnessError::assertion(format!(
                "Failed to reach inventory page, at '{}'",
                url
            )));
        }

        let items = Locator::css(INVENTORY_ITEM);
        let count = driver.count(&items).await?;
        let mut products = Vec::with_capacity(count);
        for i in 0..count {
            let item = items.clone().nth(i);
            products.push(ProductRecord {
                name: read_text(driver, &item.child(ITEM_NAME)).await?,
                description: read_text(driver, &item.child(ITEM_DESCRIPTION)).await?,
                price: read_text(driver, &item.child(ITEM_PRICE)).await?,
                image_url: driver
                    .attribute(&item.child(ITEM_IMAGE), "src")
                    .await?
                    .unwrap_or_default(),
            });
        }
        Ok(products)
    }
}

async fn read_text(driver: &mut dyn Driver, target: &Locator) -> HarnessResult<String> {
    Ok(driver.text_content(target).await?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_only() {
        use CaseState::*;
        assert!(Pending.can_transition_to(Navigating));
        assert!(Authenticating.can_transition_to(Verifying));
        assert!(Verifying.can_transition_to(Passed));
        assert!(!Pending.can_transition_to(Acting));
        assert!(!Verifying.can_transition_to(Navigating));
        assert!(!Acting.can_transition_to(Passed));
    }

    #[test]
    fn failed_is_terminal_and_reachable() {
        use CaseState::*;
        for state in [Pending, Navigating, Authenticating, Acting, Verifying] {
            assert!(state.can_transition_to(Failed), "{:?} -> Failed", state);
        }
        assert!(Failed.is_terminal());
        assert!(!Failed.can_transition_to(Pending));
        assert!(!Passed.can_transition_to(Failed));
    }

    #[test]
    fn failing_step_is_annotated() {
        let mut run = CaseRun::start("locked_out");
        run.enter(CaseState::Navigating).unwrap();
        let failure = run
            .check::<()>("navigate", Err(HarnessError::timeout("navigation", 30_000)))
            .unwrap_err();
        assert_eq!(failure.state, CaseState::Navigating);
        assert_eq!(failure.step, "navigate");
        assert_eq!(run.state, CaseState::Failed);
        assert!(run.enter(CaseState::Authenticating).is_err());

        let err = failure.into_error();
        assert!(err.is_timeout());
        assert!(err.to_string().starts_with("Test case 'locked_out' failed at step 'navigate'"));
    }
}
