//! Scripted in-memory storefront for integration tests
//!
//! Pages are rendered into a tiny node tree on every query and locators are
//! resolved against it step by step, the same way the browser resolves a
//! selector chain.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use sauce_harness::driver::LocatorStep;
use sauce_harness::{
    Driver, DriverLauncher, HarnessConfig, HarnessError, HarnessResult, LoadState, Locator,
    UrlPattern, WaitState,
};

pub const BASE_URL: &str = "https://www.saucedemo.com/";
pub const LOCKED_OUT: &str = "Epic sadface: Sorry, this user has been locked out.";
pub const BAD_CREDENTIALS: &str = "Epic sadface: Username and password do not match any user in this service";
pub const GLITCH_DELAY: Duration = Duration::from_millis(5_000);

#[derive(Debug, Clone)]
pub struct Product {
    pub name: &'static str,
    pub description: &'static str,
    pub price: String,
    pub image: &'static str,
}

pub fn catalog() -> Vec<Product> {
    let item = |name, description, price: &str, image| Product {
        name,
        description,
        price: price.to_string(),
        image,
    };
    vec![
        item(
            "Sauce Labs Backpack",
            "carry.allTheThings() with the sleek, streamlined Sly Pack that melds uncompromising style with unequaled laptop and tablet protection.",
            "$29.99",
            "/static/media/sauce-backpack-1200x1500.jpg",
        ),
        item(
            "Sauce Labs Bike Light",
            "A red light isn't the desired state in testing but it sure helps when riding your bike at night.",
            "$9.99",
            "/static/media/bike-light-1200x1500.jpg",
        ),
        item(
            "Sauce Labs Bolt T-Shirt",
            "Get your testing superhero on with the Sauce Labs bolt T-shirt.",
            "$15.99",
            "/static/media/bolt-shirt-1200x1500.jpg",
        ),
        item(
            "Sauce Labs Fleece Jacket",
            "It's not every day that you come across a midweight quarter-zip fleece jacket capable of handling everything.",
            "$49.99",
            "/static/media/sauce-pullover-1200x1500.jpg",
        ),
        item(
            "Sauce Labs Onesie",
            "Rib snap infant onesie for the junior automation engineer in development.",
            "$7.99",
            "/static/media/red-onesie-1200x1500.jpg",
        ),
        item(
            "Test.allTheThings() T-Shirt (Red)",
            "This classic Sauce Labs t-shirt is perfect to wear when cozying up to your keyboard to automate a few tests.",
            "$15.99",
            "/static/media/red-tatt-1200x1500.jpg",
        ),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Blank,
    Login,
    Inventory,
    Details(usize),
    Cart,
    CheckoutInfo,
    Overview,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Login,
    AddToCart(usize),
    OpenDetails(usize),
    OpenCart,
    Checkout,
    Continue,
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Password,
    FirstName,
    LastName,
    PostalCode,
}

#[derive(Debug, Default)]
struct Node {
    selectors: Vec<&'static str>,
    text: String,
    src: Option<String>,
    action: Option<Action>,
    field: Option<Field>,
    children: Vec<Node>,
}

impl Node {
    fn new(selector: &'static str) -> Self {
        Self {
            selectors: vec![selector],
            ..Default::default()
        }
    }

    fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    fn field(mut self, field: Field) -> Self {
        self.field = Some(field);
        self
    }

    fn child(mut self, node: Node) -> Self {
        self.children.push(node);
        self
    }

    fn matches(&self, css: &str) -> bool {
        self.selectors.contains(&css)
    }

    fn full_text(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.full_text());
        }
        out
    }

    fn descendants<'a>(&'a self, css: &str, out: &mut Vec<&'a Node>) {
        for child in &self.children {
            if child.matches(css) {
                out.push(child);
            }
            child.descendants(css, out);
        }
    }
}

/// What the fake recorded, shared with the test after the driver is gone
#[derive(Debug, Default)]
pub struct Recorder {
    pub launches: u32,
    pub closes: u32,
    pub screenshots: Vec<PathBuf>,
    pub clicks: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct StorefrontOptions {
    pub products: Vec<Product>,
    /// Shown as the overview subtotal instead of the real sum
    pub subtotal_override: Option<String>,
    /// Every goto fails with a navigation timeout
    pub unreachable: bool,
    /// `close` reports an error after counting the call
    pub close_fails: bool,
}

impl Default for StorefrontOptions {
    fn default() -> Self {
        Self {
            products: catalog(),
            subtotal_override: None,
            unreachable: false,
            close_fails: false,
        }
    }
}

pub struct FakeStorefront {
    options: StorefrontOptions,
    recorder: Arc<Mutex<Recorder>>,
    base_url: String,
    page: Page,
    user: Option<String>,
    username: String,
    password: String,
    first_name: String,
    last_name: String,
    postal_code: String,
    error: Option<String>,
    cart: Vec<usize>,
    pending_delay: Duration,
}

impl FakeStorefront {
    pub fn new(options: StorefrontOptions, recorder: Arc<Mutex<Recorder>>) -> Self {
        Self {
            options,
            recorder,
            base_url: BASE_URL.to_string(),
            page: Page::Blank,
            user: None,
            username: String::new(),
            password: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            postal_code: String::new(),
            error: None,
            cart: Vec::new(),
            pending_delay: Duration::ZERO,
        }
    }

    pub fn standalone() -> Self {
        Self::new(StorefrontOptions::default(), Arc::new(Mutex::new(Recorder::default())))
    }

    pub fn location(&self) -> String {
        self.url()
    }

    pub fn cart_len(&self) -> usize {
        self.cart.len()
    }

    fn url(&self) -> String {
        let path = match self.page {
            Page::Blank => return "about:blank".to_string(),
            Page::Login => "",
            Page::Inventory => "inventory.html",
            Page::Details(i) => return format!("{}inventory-item.html?id={}", self.base_url, i),
            Page::Cart => "cart.html",
            Page::CheckoutInfo => "checkout-step-one.html",
            Page::Overview => "checkout-step-two.html",
            Page::Complete => "checkout-complete.html",
        };
        format!("{}{}", self.base_url, path)
    }

    fn header(&self) -> Node {
        let mut header = Node::new(".primary_header")
            .child(Node::new("#react-burger-menu-btn").text("Open Menu"))
            .child(Node::new(".shopping_cart_link").action(Action::OpenCart));
        if !self.cart.is_empty() {
            header = header.child(Node::new(".shopping_cart_badge").text(self.cart.len().to_string()));
        }
        header
    }

    fn error_node(&self) -> Option<Node> {
        self.error
            .as_ref()
            .map(|e| Node::new("[data-test=\"error\"]").text(e.clone()))
    }

    fn cart_lines(&self) -> Vec<Node> {
        self.cart
            .iter()
            .map(|&i| {
                let product = &self.options.products[i];
                Node::new(".cart_item")
                    .child(Node::new(".inventory_item_name").text(product.name))
                    .child(Node::new(".inventory_item_price").text(product.price.clone()))
            })
            .collect()
    }

    fn render(&self) -> Node {
        let mut root = Node::default();
        match self.page {
            Page::Blank => {}
            Page::Login => {
                root = root
                    .child(Node::new("#user-name").field(Field::Username))
                    .child(Node::new("#password").field(Field::Password))
                    .child(Node::new("#login-button").action(Action::Login));
                if let Some(error) = self.error_node() {
                    root = root.child(error);
                }
            }
            Page::Inventory => {
                root = root.child(self.header());
                for (i, product) in self.options.products.iter().enumerate() {
                    let mut image = Node::new("img.inventory_item_img");
                    image.src = Some(product.image.to_string());
                    root = root.child(
                        Node::new(".inventory_item")
                            .child(image)
                            .child(
                                Node::new(".inventory_item_name")
                                    .text(product.name)
                                    .action(Action::OpenDetails(i)),
                            )
                            .child(Node::new(".inventory_item_desc").text(product.description))
                            .child(Node::new(".inventory_item_price").text(product.price.clone()))
                            .child(Node::new(".btn_inventory").text("Add to cart").action(Action::AddToCart(i))),
                    );
                }
            }
            Page::Details(i) => {
                let product = &self.options.products[i];
                root = root
                    .child(self.header())
                    .child(Node::new(".inventory_details_name").text(product.name))
                    .child(Node::new(".inventory_details_desc").text(format!("  {}\n", product.description)));
            }
            Page::Cart => {
                root = root.child(self.header());
                for line in self.cart_lines() {
                    root = root.child(line);
                }
                root = root.child(Node::new("#checkout").action(Action::Checkout));
            }
            Page::CheckoutInfo => {
                root = root
                    .child(self.header())
                    .child(Node::new("#first-name").field(Field::FirstName))
                    .child(Node::new("#last-name").field(Field::LastName))
                    .child(Node::new("#postal-code").field(Field::PostalCode))
                    .child(Node::new("#continue").action(Action::Continue));
                if let Some(error) = self.error_node() {
                    root = root.child(error);
                }
            }
            Page::Overview => {
                root = root.child(self.header());
                for line in self.cart_lines() {
                    root = root.child(line);
                }
                let subtotal = self.options.subtotal_override.clone().unwrap_or_else(|| {
                    let cents: i64 = self.cart.iter().map(|&i| cents(&self.options.products[i].price)).sum();
                    format!("Item total: ${}.{:02}", cents / 100, cents % 100)
                });
                root = root
                    .child(Node::new(".summary_subtotal_label").text(subtotal))
                    .child(Node::new("#finish").action(Action::Finish));
            }
            Page::Complete => {
                root = root
                    .child(self.header())
                    .child(Node::new(".complete-header").text("Thank you for your order!"));
            }
        }
        root
    }

    fn with_resolved<T>(&self, target: &Locator, f: impl FnOnce(Vec<&Node>) -> T) -> T {
        let root = self.render();
        let mut current: Vec<&Node> = vec![&root];
        for step in target.steps() {
            current = match step {
                LocatorStep::Css(css) => {
                    let mut out = Vec::new();
                    for node in &current {
                        node.descendants(css, &mut out);
                    }
                    out
                }
                LocatorStep::HasText { css, inner, text } => {
                    let mut candidates = Vec::new();
                    for node in &current {
                        node.descendants(css, &mut candidates);
                    }
                    candidates
                        .into_iter()
                        .filter(|node| {
                            let mut inners = Vec::new();
                            node.descendants(inner, &mut inners);
                            inners.iter().any(|n| n.full_text().contains(text.as_str()))
                        })
                        .collect()
                }
                LocatorStep::Nth(i) => current.get(*i).copied().into_iter().collect(),
            };
        }
        f(current)
    }

    fn first_match(&self, target: &Locator) -> Option<(Option<Action>, Option<Field>)> {
        self.with_resolved(target, |nodes| nodes.first().map(|n| (n.action, n.field)))
    }

    fn perform(&mut self, action: Action) {
        match action {
            Action::Login => self.login(),
            Action::AddToCart(i) => {
                if !self.cart.contains(&i) {
                    self.cart.push(i);
                }
            }
            Action::OpenDetails(i) => self.page = Page::Details(i),
            Action::OpenCart => self.page = Page::Cart,
            Action::Checkout => {
                self.error = None;
                self.page = Page::CheckoutInfo;
            }
            Action::Continue => {
                self.error = if self.first_name.is_empty() {
                    Some("Error: First Name is required".to_string())
                } else if self.last_name.is_empty() {
                    Some("Error: Last Name is required".to_string())
                } else if self.postal_code.is_empty() {
                    Some("Error: Postal Code is required".to_string())
                } else {
                    None
                };
                if self.error.is_none() {
                    self.page = Page::Overview;
                }
            }
            Action::Finish => {
                self.cart.clear();
                self.page = Page::Complete;
            }
        }
    }

    fn login(&mut self) {
        let username = self.username.clone();
        self.error = None;
        if username.is_empty() {
            self.error = Some("Epic sadface: Username is required".to_string());
            return;
        }
        if self.password != "secret_sauce" {
            self.error = Some(BAD_CREDENTIALS.to_string());
            return;
        }
        match username.as_str() {
            "locked_out_user" => self.error = Some(LOCKED_OUT.to_string()),
            "standard_user" | "performance_glitch_user" => {
                if username == "performance_glitch_user" {
                    self.pending_delay = GLITCH_DELAY;
                }
                self.user = Some(username);
                self.page = Page::Inventory;
            }
            _ => self.error = Some(BAD_CREDENTIALS.to_string()),
        }
    }
}

fn cents(price: &str) -> i64 {
    let digits: String = price.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

fn not_found(target: &Locator, timeout: Duration) -> HarnessError {
    HarnessError::timeout(target.to_string(), timeout.as_millis() as u64)
}

#[async_trait]
impl Driver for FakeStorefront {
    async fn goto(&mut self, url: &str, timeout: Duration) -> HarnessResult<()> {
        if self.options.unreachable {
            return Err(HarnessError::timeout(format!("navigation to {}", url), timeout.as_millis() as u64));
        }
        self.base_url = url.to_string();
        self.page = Page::Login;
        self.user = None;
        self.username.clear();
        self.password.clear();
        self.error = None;
        Ok(())
    }

    async fn fill(&mut self, target: &Locator, value: &str, timeout: Duration) -> HarnessResult<()> {
        let field = self
            .first_match(target)
            .and_then(|(_, field)| field)
            .ok_or_else(|| not_found(target, timeout))?;
        let slot = match field {
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::PostalCode => &mut self.postal_code,
        };
        *slot = value.to_string();
        Ok(())
    }

    async fn click(&mut self, target: &Locator, timeout: Duration) -> HarnessResult<()> {
        let (action, _) = self.first_match(target).ok_or_else(|| not_found(target, timeout))?;
        self.recorder.lock().clicks.push(target.to_string());
        if let Some(action) = action {
            self.perform(action);
        }
        Ok(())
    }

    async fn count(&mut self, target: &Locator) -> HarnessResult<usize> {
        Ok(self.with_resolved(target, |nodes| nodes.len()))
    }

    async fn is_visible(&mut self, target: &Locator) -> HarnessResult<bool> {
        Ok(self.with_resolved(target, |nodes| !nodes.is_empty()))
    }

    async fn text_content(&mut self, target: &Locator) -> HarnessResult<Option<String>> {
        Ok(self.with_resolved(target, |nodes| nodes.first().map(|n| n.full_text())))
    }

    async fn attribute(&mut self, target: &Locator, name: &str) -> HarnessResult<Option<String>> {
        Ok(self.with_resolved(target, |nodes| {
            nodes
                .first()
                .and_then(|n| if name == "src" { n.src.clone() } else { None })
        }))
    }

    async fn wait_for(&mut self, target: &Locator, state: WaitState, timeout: Duration) -> HarnessResult<()> {
        let present = self.with_resolved(target, |nodes| !nodes.is_empty());
        let satisfied = match state {
            WaitState::Visible | WaitState::Attached => present,
            WaitState::Hidden | WaitState::Detached => !present,
        };
        if satisfied {
            Ok(())
        } else {
            Err(not_found(target, timeout))
        }
    }

    async fn wait_for_url(&mut self, pattern: &UrlPattern, timeout: Duration) -> HarnessResult<()> {
        if pattern.matches(&self.url()) {
            Ok(())
        } else {
            Err(HarnessError::timeout(format!("url {}", pattern), timeout.as_millis() as u64))
        }
    }

    async fn wait_for_load_state(&mut self, state: LoadState, timeout: Duration) -> HarnessResult<()> {
        let delay = std::mem::take(&mut self.pending_delay);
        if delay > timeout {
            tokio::time::sleep(timeout).await;
            return Err(HarnessError::timeout(format!("load state {}", state.as_str()), timeout.as_millis() as u64));
        }
        tokio::time::sleep(delay).await;
        Ok(())
    }

    async fn current_url(&mut self) -> HarnessResult<String> {
        Ok(self.url())
    }

    async fn screenshot(&mut self, path: &Path) -> HarnessResult<()> {
        std::fs::write(path, b"\x89PNG fake")?;
        self.recorder.lock().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&mut self) -> HarnessResult<()> {
        self.recorder.lock().closes += 1;
        if self.options.close_fails {
            return Err(HarnessError::Driver("browser process already gone".to_string()));
        }
        Ok(())
    }
}

/// Launches fresh storefronts and counts how often it was asked to
#[derive(Clone)]
pub struct FakeLauncher {
    options: StorefrontOptions,
    pub recorder: Arc<Mutex<Recorder>>,
    fail: bool,
}

impl FakeLauncher {
    pub fn new(options: StorefrontOptions) -> Self {
        Self {
            options,
            recorder: Arc::new(Mutex::new(Recorder::default())),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(StorefrontOptions::default())
        }
    }

    pub fn launches(&self) -> u32 {
        self.recorder.lock().launches
    }

    pub fn closes(&self) -> u32 {
        self.recorder.lock().closes
    }
}

#[async_trait]
impl DriverLauncher for FakeLauncher {
    async fn launch(&self) -> HarnessResult<Box<dyn Driver>> {
        self.recorder.lock().launches += 1;
        if self.fail {
            return Err(HarnessError::Driver("browser binary missing".to_string()));
        }
        Ok(Box::new(FakeStorefront::new(self.options.clone(), self.recorder.clone())))
    }
}

/// Config rooted in a temp directory with zero retry delays
pub fn test_config(root: &Path) -> HarnessConfig {
    let mut config = HarnessConfig::default();
    config.app.base_url = BASE_URL.to_string();
    config.paths.data_dir = root.join("test_data");
    config.paths.logs_dir = root.join("logs");
    config.paths.screenshots_dir = root.join("screenshots");
    config.paths.results_dir = root.join("test-results");
    config.paths.export_path = root.join("products.csv");
    config.paths.product_search_config = root.join("test_data/product_search_config.json");
    config.retry.config.delay_ms = 0;
    config.retry.suite.delay_ms = 0;
    config.timeouts.settle_ms = 0;
    config
}

pub fn write_data(root: &Path, file: &str, content: &str) {
    let dir = root.join("test_data");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(file), content).unwrap();
}
