//! Application state management for Marketbook.
//!
//! This module contains the core `App` struct that manages all application state,
//! including UI state, the product list, session management, and background
//! task coordination.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use marketbook_core::account::{self, AvatarPhoto, SIGN_UP_FALLBACK, UPDATE_PROFILE_FALLBACK};
use marketbook_core::auth::{CredentialStore, FileStore, SIGN_IN_FALLBACK};
use marketbook_core::catalog::{
    self, CATEGORIES_FALLBACK, PRODUCTS_FALLBACK, PRODUCT_DETAILS_FALLBACK,
    PRODUCT_VIEWS_FALLBACK,
};
use marketbook_core::utils::{digits_only, mask_currency};
use marketbook_core::validation::{ProfileForm, SignInForm, SignUpForm, ValidationError};
use marketbook_core::{
    user_message, Category, Config, FilterCriteria, Product, ProductFilter, Seller,
    SessionManager,
};

use crate::form::{Field, FormState};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Number of items to scroll on page up/down
pub const PAGE_SCROLL_SIZE: usize = 10;

/// How long a status message stays in the status bar
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(4);

/// Environment variables that pre-fill the sign-in form
const EMAIL_ENV: &str = "MARKETBOOK_EMAIL";
const PASSWORD_ENV: &str = "MARKETBOOK_PASSWORD";

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Products,
    Profile,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Products => "Products",
            Tab::Profile => "Profile",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Products => Tab::Profile,
            Tab::Profile => Tab::Products,
        }
    }

    pub fn prev(&self) -> Self {
        self.next()
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    Filtering,
    ViewingProduct,
    EditingProfile,
    ShowingHelp,
    SigningIn,
    SigningUp,
    ConfirmingSignOut,
    ConfirmingQuit,
    Quitting,
}

/// Focus inside the filter dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFocus {
    MinPrice,
    MaxPrice,
    Categories,
}

impl FilterFocus {
    pub fn next(&self) -> Self {
        match self {
            FilterFocus::MinPrice => FilterFocus::MaxPrice,
            FilterFocus::MaxPrice => FilterFocus::Categories,
            FilterFocus::Categories => FilterFocus::MinPrice,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FilterFocus::MinPrice => FilterFocus::Categories,
            FilterFocus::MaxPrice => FilterFocus::MinPrice,
            FilterFocus::Categories => FilterFocus::MaxPrice,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// Transient message shown in the status bar
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    shown_at: Instant,
}

/// Product opened from the list, with its separately loaded view count
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub views: Option<u64>,
    pub loading: bool,
}

/// Slow user actions. They are queued by input handling and run after the
/// next frame, so the triggering control is drawn as busy while they await.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    SignIn,
    SignUp,
    UpdateProfile,
    SignOut,
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from spawned load tasks back to the event loop.
/// Failures carry the message to show the user.
enum LoadResult {
    Products(Result<Vec<Product>, String>),
    Categories(Result<Vec<Category>, String>),
    ProductDetail {
        id: String,
        product: Result<Product, String>,
        views: Result<u64, String>,
    },
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub session: SessionManager,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub search_query: String,

    // Forms
    pub sign_in_form: FormState,
    pub sign_up_form: FormState,
    pub profile_form: FormState,
    /// Submission waiting for the next frame to be drawn
    pub pending_action: Option<PendingAction>,

    // Signed-in seller, mirrored from the session for rendering
    pub seller: Option<Seller>,

    // Products
    pub products: ProductFilter,
    visible: Vec<usize>,
    pub categories: Vec<Category>,
    pub product_selection: usize,
    pub product_detail: Option<ProductDetail>,
    pub loading_products: bool,

    // Filter dialog
    pub criteria: FilterCriteria,
    pub filter_draft: FilterCriteria,
    pub filter_focus: FilterFocus,
    pub category_selection: usize,

    // Background task channel
    load_rx: mpsc::Receiver<LoadResult>,
    load_tx: mpsc::Sender<LoadResult>,

    pub status_message: Option<StatusMessage>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Result<Self> {
        let store = FileStore::new(config.data_dir()?);
        let session = SessionManager::new(&config.api_base_url(), Arc::new(store))?;
        debug!(base_url = %session.api().base_url(), "Session manager created");

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Pre-fill credentials from env vars, the config and the keychain
        let mut sign_in_form = FormState::sign_in();
        let email = std::env::var(EMAIL_ENV)
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();
        let password = std::env::var(PASSWORD_ENV).ok().or_else(|| {
            if !email.is_empty() && CredentialStore::has_credentials(&email) {
                CredentialStore::get_password(&email).ok()
            } else {
                None
            }
        });
        sign_in_form.set(Field::Email, &email);
        if let Some(ref password) = password {
            sign_in_form.set(Field::Password, password);
        }

        let products = ProductFilter::new(config.price_locale.clone());

        Ok(Self {
            config,
            session,

            state: AppState::Normal,
            current_tab: Tab::Products,
            search_query: String::new(),

            sign_in_form,
            sign_up_form: FormState::sign_up(),
            profile_form: FormState::profile(),
            pending_action: None,

            seller: None,

            products,
            visible: Vec::new(),
            categories: Vec::new(),
            product_selection: 0,
            product_detail: None,
            loading_products: false,

            criteria: FilterCriteria::default(),
            filter_draft: FilterCriteria::default(),
            filter_focus: FilterFocus::MinPrice,
            category_selection: 0,

            load_rx: rx,
            load_tx: tx,

            status_message: None,
        })
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Queue a slow action unless one is already waiting
    pub fn request(&mut self, action: PendingAction) {
        if self.pending_action.is_none() {
            self.pending_action = Some(action);
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending_action.is_some()
    }

    /// Run the queued action, if any
    pub async fn run_pending_action(&mut self) {
        let Some(action) = self.pending_action.take() else {
            return;
        };
        debug!(?action, "Running action");
        match action {
            PendingAction::SignIn => self.attempt_sign_in().await,
            PendingAction::SignUp => self.attempt_sign_up().await,
            PendingAction::UpdateProfile => self.attempt_profile_update().await,
            PendingAction::SignOut => self.sign_out().await,
        }
    }

    /// Restore the persisted session, then either load data or show sign-in
    pub async fn start(&mut self) {
        if self.session.restore_session().await {
            self.seller = self.session.current_seller().await;
            self.on_signed_in().await;
        } else {
            self.start_sign_in();
        }
    }

    /// Show the sign-in overlay
    pub fn start_sign_in(&mut self) {
        self.state = AppState::SigningIn;
        self.sign_in_form.errors = Default::default();
        if !self.sign_in_form.value(Field::Email).is_empty() {
            self.sign_in_form.focus_field(Field::Password);
        }
    }

    pub fn start_sign_up(&mut self) {
        self.sign_up_form.reset();
        self.state = AppState::SigningUp;
    }

    /// Submit the sign-in form
    pub async fn attempt_sign_in(&mut self) {
        let form = SignInForm {
            email: self.sign_in_form.value(Field::Email).trim().to_string(),
            password: self.sign_in_form.value(Field::Password).to_string(),
        };
        if let Err(e) = form.validate() {
            self.show_validation_errors(FormKind::SignIn, e);
            return;
        }
        self.sign_in_form.errors = Default::default();

        let result = self.session.sign_in(&form.email, &form.password).await;

        match result {
            Ok(seller) => {
                self.remember_credentials(&form.email, &form.password);
                self.seller = Some(seller);
                self.sign_in_form.clear_secrets();
                self.on_signed_in().await;
            }
            Err(e) => self.set_status(StatusKind::Error, user_message(&e, SIGN_IN_FALLBACK)),
        }
    }

    /// Submit the sign-up form; a successful registration signs the seller in
    pub async fn attempt_sign_up(&mut self) {
        let form = SignUpForm {
            name: self.sign_up_form.value(Field::Name).to_string(),
            phone: self.sign_up_form.value(Field::Phone).to_string(),
            email: self.sign_up_form.value(Field::Email).trim().to_string(),
            password: self.sign_up_form.value(Field::Password).to_string(),
            password_confirmation: self
                .sign_up_form
                .value(Field::PasswordConfirmation)
                .to_string(),
        };
        if let Err(e) = form.validate() {
            self.show_validation_errors(FormKind::SignUp, e);
            return;
        }
        self.sign_up_form.errors = Default::default();

        let photo = match self.load_photo(self.sign_up_form.value(Field::Photo).to_string()) {
            Ok(photo) => photo,
            Err(message) => {
                self.set_status(StatusKind::Error, message);
                return;
            }
        };

        let result = account::sign_up(&self.session, &form, photo.as_ref()).await;

        match result {
            Ok(seller) => {
                self.remember_credentials(&form.email, &form.password);
                self.sign_in_form.set(Field::Email, &form.email);
                self.sign_up_form.reset();
                self.seller = Some(seller);
                self.on_signed_in().await;
            }
            Err(e) => self.set_status(StatusKind::Error, user_message(&e, SIGN_UP_FALLBACK)),
        }
    }

    fn remember_credentials(&mut self, email: &str, password: &str) {
        if let Err(e) = CredentialStore::store(email, password) {
            warn!(error = %e, "Failed to store credentials");
        }
        self.config.last_email = Some(email.to_string());
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    async fn on_signed_in(&mut self) {
        self.state = AppState::Normal;
        self.current_tab = Tab::Products;
        if let Some(greeting) = self.seller.as_ref().map(Seller::greeting) {
            self.set_status(StatusKind::Info, greeting);
        }
        self.refresh_products();
        self.refresh_categories();
    }

    /// Sign out and return to the sign-in overlay. An explicit sign-out also
    /// forgets the remembered password.
    pub async fn sign_out(&mut self) {
        let email = self.seller.as_ref().map(|seller| seller.email.clone());
        self.session.sign_out().await;
        if let Some(email) = email {
            self.forget_credentials(&email);
        }
        self.on_signed_out();
    }

    fn forget_credentials(&mut self, email: &str) {
        if let Err(e) = CredentialStore::delete(email) {
            warn!(error = %e, "Failed to forget stored credentials");
        }
        self.sign_in_form.clear_secrets();
    }

    fn on_signed_out(&mut self) {
        self.seller = None;
        self.products.set_products(Vec::new());
        self.visible.clear();
        self.categories.clear();
        self.product_detail = None;
        self.product_selection = 0;
        self.search_query.clear();
        self.criteria = FilterCriteria::default();
        self.profile_form.reset();
        self.start_sign_in();
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Open the profile form pre-filled with the signed-in seller
    pub fn start_profile_edit(&mut self) {
        let Some(ref seller) = self.seller else {
            return;
        };
        self.profile_form.reset();
        self.profile_form.set(Field::Name, &seller.name);
        self.profile_form.set(Field::Phone, &seller.phone);
        self.profile_form.set(Field::Email, &seller.email);
        self.state = AppState::EditingProfile;
    }

    pub async fn attempt_profile_update(&mut self) {
        let form = ProfileForm {
            name: self.profile_form.value(Field::Name).to_string(),
            phone: self.profile_form.value(Field::Phone).to_string(),
            email: self.profile_form.value(Field::Email).trim().to_string(),
            password: self.profile_form.value(Field::Password).to_string(),
            new_password: self.profile_form.value(Field::NewPassword).to_string(),
            new_password_confirmation: self
                .profile_form
                .value(Field::NewPasswordConfirmation)
                .to_string(),
        };
        if let Err(e) = form.validate() {
            self.show_validation_errors(FormKind::Profile, e);
            return;
        }
        self.profile_form.errors = Default::default();

        let photo = match self.load_photo(self.profile_form.value(Field::Photo).to_string()) {
            Ok(photo) => photo,
            Err(message) => {
                self.set_status(StatusKind::Error, message);
                return;
            }
        };

        let result = account::update_profile(&self.session, &form, photo.as_ref()).await;

        match result {
            Ok(seller) => {
                if let Some((_, new_password)) = form.password_change() {
                    if CredentialStore::has_credentials(&seller.email) {
                        if let Err(e) = CredentialStore::store(&seller.email, &new_password) {
                            warn!(error = %e, "Failed to update stored credentials");
                        }
                    }
                }
                self.seller = Some(seller);
                self.profile_form.clear_secrets();
                self.state = AppState::Normal;
                self.set_status(StatusKind::Success, "Profile updated!");
            }
            Err(e) => {
                self.set_status(StatusKind::Error, user_message(&e, UPDATE_PROFILE_FALLBACK));
                // A 401 during the update already ended the session
                self.sync_session().await;
            }
        }
    }

    /// Read the avatar photo named in a form, if any
    fn load_photo(&self, path: String) -> Result<Option<AvatarPhoto>, String> {
        let path = path.trim();
        if path.is_empty() {
            return Ok(None);
        }
        AvatarPhoto::from_path(Path::new(path))
            .map(Some)
            .map_err(|e| e.to_string())
    }

    fn show_validation_errors(&mut self, kind: FormKind, error: ValidationError) {
        let form = match kind {
            FormKind::SignIn => &mut self.sign_in_form,
            FormKind::SignUp => &mut self.sign_up_form,
            FormKind::Profile => &mut self.profile_form,
        };
        form.errors = error.0;
        form.focus_first_error();
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Fetch the full product list in the background
    pub fn refresh_products(&mut self) {
        self.loading_products = true;
        let api = self.session.api().clone();
        let tx = self.load_tx.clone();
        tokio::spawn(async move {
            let result = catalog::load_products(&api)
                .await
                .map_err(|e| user_message(&e, PRODUCTS_FALLBACK));
            let _ = tx.send(LoadResult::Products(result)).await;
        });
    }

    fn refresh_categories(&mut self) {
        let api = self.session.api().clone();
        let tx = self.load_tx.clone();
        tokio::spawn(async move {
            let result = catalog::load_categories(&api)
                .await
                .map_err(|e| user_message(&e, CATEGORIES_FALLBACK));
            let _ = tx.send(LoadResult::Categories(result)).await;
        });
    }

    /// Open the selected product and load its details and views
    pub fn open_selected_product(&mut self) {
        let Some(product) = self.selected_product().cloned() else {
            return;
        };

        let id = product.id.clone();
        self.product_detail = Some(ProductDetail {
            product,
            views: None,
            loading: true,
        });
        self.state = AppState::ViewingProduct;

        let api = self.session.api().clone();
        let tx = self.load_tx.clone();
        tokio::spawn(async move {
            let details = catalog::load_product_details(&api, &id).await;
            let result = LoadResult::ProductDetail {
                id,
                product: details
                    .product
                    .map_err(|e| user_message(&e, PRODUCT_DETAILS_FALLBACK)),
                views: details
                    .views
                    .map_err(|e| user_message(&e, PRODUCT_VIEWS_FALLBACK)),
            };
            let _ = tx.send(result).await;
        });
    }

    pub fn close_product(&mut self) {
        self.product_detail = None;
        self.state = AppState::Normal;
    }

    /// Show the chat link for the open product's owner
    pub fn show_contact_link(&mut self) {
        let Some(ref detail) = self.product_detail else {
            return;
        };
        match catalog::contact_url(&detail.product) {
            Ok(url) => self.set_status(StatusKind::Info, url.to_string()),
            Err(e) => {
                warn!(error = %e, "Failed to build contact link");
                self.set_status(StatusKind::Error, "Unable to open the contact link!");
            }
        }
    }

    /// Products passing the current search and filters, in list order
    pub fn visible_products(&self) -> Vec<&Product> {
        let products = self.products.products();
        self.visible.iter().filter_map(|&i| products.get(i)).collect()
    }

    pub fn selected_product(&self) -> Option<&Product> {
        self.visible
            .get(self.product_selection)
            .and_then(|&i| self.products.products().get(i))
    }

    /// Recompute the visible list after the products, search or filters change
    pub fn update_visible(&mut self) {
        self.visible = self
            .products
            .visible_indices(&self.search_query, &self.criteria)
            .to_vec();
        if self.product_selection >= self.visible.len() {
            self.product_selection = self.visible.len().saturating_sub(1);
        }
    }

    pub fn select_next_product(&mut self, step: usize) {
        let last = self.visible.len().saturating_sub(1);
        self.product_selection = (self.product_selection + step).min(last);
    }

    pub fn select_last_product(&mut self) {
        self.product_selection = self.visible.len().saturating_sub(1);
    }

    pub fn select_prev_product(&mut self, step: usize) {
        self.product_selection = self.product_selection.saturating_sub(step);
    }

    // =========================================================================
    // Search and filters
    // =========================================================================

    pub fn push_search_char(&mut self, c: char) {
        if c.is_control() {
            return;
        }
        self.search_query.push(c);
        self.product_selection = 0;
        self.update_visible();
    }

    pub fn pop_search_char(&mut self) {
        self.search_query.pop();
        self.product_selection = 0;
        self.update_visible();
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.update_visible();
    }

    /// Open the filter dialog with a copy of the applied criteria
    pub fn open_filters(&mut self) {
        self.filter_draft = self.criteria.clone();
        self.filter_focus = FilterFocus::MinPrice;
        self.category_selection = 0;
        self.state = AppState::Filtering;
    }

    /// Replace the applied criteria with the dialog's draft
    pub fn apply_filters(&mut self) {
        self.criteria = std::mem::take(&mut self.filter_draft);
        self.state = AppState::Normal;
        self.product_selection = 0;
        self.update_visible();
    }

    /// Reset every filter and close the dialog
    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::default();
        self.filter_draft = FilterCriteria::default();
        self.state = AppState::Normal;
        self.product_selection = 0;
        self.update_visible();
    }

    /// Type into the focused price bound, keeping it masked as currency
    pub fn push_filter_char(&mut self, c: char) {
        if !c.is_ascii_digit() {
            return;
        }
        let locale = self.products.locale().clone();
        if let Some(bound) = self.focused_bound() {
            let mut digits = digits_only(bound);
            digits.push(c);
            *bound = mask_currency(&digits, &locale);
        }
    }

    pub fn pop_filter_char(&mut self) {
        let locale = self.products.locale().clone();
        if let Some(bound) = self.focused_bound() {
            let mut digits = digits_only(bound);
            digits.pop();
            *bound = mask_currency(&digits, &locale);
        }
    }

    fn focused_bound(&mut self) -> Option<&mut String> {
        match self.filter_focus {
            FilterFocus::MinPrice => Some(&mut self.filter_draft.min_price),
            FilterFocus::MaxPrice => Some(&mut self.filter_draft.max_price),
            FilterFocus::Categories => None,
        }
    }

    pub fn toggle_selected_category(&mut self) {
        if let Some(category) = self.categories.get(self.category_selection) {
            let slug = category.slug.clone();
            self.filter_draft.toggle_category(&slug);
        }
    }

    // =========================================================================
    // Background tasks
    // =========================================================================

    /// Check for completed background tasks and expired status messages
    pub async fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.load_rx.try_recv() {
            results.push(result);
        }
        let any = !results.is_empty();
        for result in results {
            self.process_load_result(result);
        }

        if any {
            // A 401 on any load signs the session out
            self.sync_session().await;
        }

        if let Some(ref message) = self.status_message {
            if message.shown_at.elapsed() >= STATUS_MESSAGE_TTL {
                self.status_message = None;
            }
        }
    }

    fn process_load_result(&mut self, result: LoadResult) {
        // Loads started before a sign-out may still finish
        if self.seller.is_none() {
            debug!("Dropping load result after sign-out");
            return;
        }
        match result {
            LoadResult::Products(Ok(products)) => {
                debug!(count = products.len(), "Products loaded");
                self.products.set_products(products);
                self.loading_products = false;
                self.update_visible();
            }
            LoadResult::Products(Err(message)) => {
                self.loading_products = false;
                self.set_status(StatusKind::Error, message);
            }
            LoadResult::Categories(Ok(categories)) => {
                self.categories = categories;
            }
            LoadResult::Categories(Err(message)) => {
                self.set_status(StatusKind::Error, message);
            }
            LoadResult::ProductDetail { id, product, views } => {
                let Some(ref mut detail) = self.product_detail else {
                    return;
                };
                if detail.product.id != id {
                    return;
                }
                detail.loading = false;
                let mut errors = Vec::new();
                match product {
                    Ok(product) => detail.product = product,
                    Err(message) => errors.push(message),
                }
                match views {
                    Ok(views) => detail.views = Some(views),
                    Err(message) => errors.push(message),
                }
                if !errors.is_empty() {
                    self.set_status(StatusKind::Error, errors.join(" "));
                }
            }
        }
    }

    /// Follow a sign-out that happened inside the session (a rejected token)
    async fn sync_session(&mut self) {
        if self.seller.is_some() && !self.session.is_authenticated().await {
            info!("Session ended by the server");
            self.on_signed_out();
        }
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            kind,
            shown_at: Instant::now(),
        });
    }
}

#[derive(Debug, Clone, Copy)]
enum FormKind {
    SignIn,
    SignUp,
    Profile,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use marketbook_core::auth::MemoryStore;

    fn seller() -> Seller {
        Seller {
            id: "s-1".to_string(),
            name: "Ana".to_string(),
            phone: "11987654321".to_string(),
            email: "ana@example.com".to_string(),
            avatar: None,
        }
    }

    fn product(id: &str, title: &str, price: u64, slug: &str) -> Product {
        Product {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            price_in_cents: price,
            status: "available".to_string(),
            owner: seller(),
            category: Category {
                id: format!("c-{}", slug),
                title: slug.to_string(),
                slug: slug.to_string(),
            },
            attachments: Vec::new(),
        }
    }

    fn app() -> App {
        let session =
            SessionManager::new("http://localhost:3333", Arc::new(MemoryStore::new())).unwrap();
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let mut app = App {
            config: Config::default(),
            session,
            state: AppState::Normal,
            current_tab: Tab::Products,
            search_query: String::new(),
            sign_in_form: FormState::sign_in(),
            sign_up_form: FormState::sign_up(),
            profile_form: FormState::profile(),
            pending_action: None,
            seller: Some(seller()),
            products: ProductFilter::new(Default::default()),
            visible: Vec::new(),
            categories: vec![
                Category {
                    id: "c-1".to_string(),
                    title: "Móveis".to_string(),
                    slug: "moveis".to_string(),
                },
                Category {
                    id: "c-2".to_string(),
                    title: "Esporte".to_string(),
                    slug: "esporte".to_string(),
                },
            ],
            product_selection: 0,
            product_detail: None,
            loading_products: false,
            criteria: FilterCriteria::default(),
            filter_draft: FilterCriteria::default(),
            filter_focus: FilterFocus::MinPrice,
            category_selection: 0,
            load_rx: rx,
            load_tx: tx,
            status_message: None,
        };
        app.products.set_products(vec![
            product("1", "Sofá", 150050, "moveis"),
            product("2", "Bicicleta", 89000, "esporte"),
            product("3", "Mesa", 45000, "moveis"),
        ]);
        app.update_visible();
        app
    }

    fn visible_ids(app: &App) -> Vec<&str> {
        app.visible_products().iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_tab_cycling() {
        assert_eq!(Tab::Products.next(), Tab::Profile);
        assert_eq!(Tab::Profile.next(), Tab::Products);
        assert_eq!(Tab::Products.prev(), Tab::Profile);
    }

    #[test]
    fn test_filter_focus_cycling() {
        assert_eq!(FilterFocus::MinPrice.next(), FilterFocus::MaxPrice);
        assert_eq!(FilterFocus::Categories.next(), FilterFocus::MinPrice);
        assert_eq!(FilterFocus::MinPrice.prev(), FilterFocus::Categories);
    }

    #[tokio::test]
    async fn test_search_updates_visible_list() {
        let mut app = app();
        assert_eq!(visible_ids(&app), vec!["1", "2", "3"]);

        for c in "MES".chars() {
            app.push_search_char(c);
        }
        assert_eq!(visible_ids(&app), vec!["3"]);

        app.clear_search();
        assert_eq!(visible_ids(&app), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_filter_draft_is_applied_wholesale() {
        let mut app = app();
        app.open_filters();
        assert_eq!(app.state, AppState::Filtering);

        for c in "50000".chars() {
            app.push_filter_char(c);
        }
        assert_eq!(app.filter_draft.min_price, "500,00");
        app.push_filter_char('x');
        assert_eq!(app.filter_draft.min_price, "500,00");

        app.filter_focus = FilterFocus::Categories;
        app.toggle_selected_category();
        // The list does not change until the draft is applied
        assert_eq!(visible_ids(&app), vec!["1", "2", "3"]);

        app.apply_filters();
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(visible_ids(&app), vec!["1"]);
        assert!(app.filter_draft.is_empty());

        app.clear_filters();
        assert!(app.criteria.is_empty());
        assert_eq!(visible_ids(&app), vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_price_mask_backspace() {
        let mut app = app();
        app.open_filters();
        app.filter_focus = FilterFocus::MaxPrice;
        for c in "1234".chars() {
            app.push_filter_char(c);
        }
        assert_eq!(app.filter_draft.max_price, "12,34");
        app.pop_filter_char();
        assert_eq!(app.filter_draft.max_price, "1,23");
        app.pop_filter_char();
        app.pop_filter_char();
        app.pop_filter_char();
        assert_eq!(app.filter_draft.max_price, "");
    }

    #[tokio::test]
    async fn test_selection_is_clamped_to_visible_list() {
        let mut app = app();
        app.select_next_product(PAGE_SCROLL_SIZE);
        assert_eq!(app.product_selection, 2);
        assert_eq!(app.selected_product().map(|p| p.id.as_str()), Some("3"));

        app.push_search_char('s');
        app.select_next_product(PAGE_SCROLL_SIZE);
        app.push_search_char('o');
        assert_eq!(visible_ids(&app), vec!["1"]);
        assert_eq!(app.product_selection, 0);

        app.select_prev_product(5);
        assert_eq!(app.product_selection, 0);
    }

    #[tokio::test]
    async fn test_product_detail_result_is_matched_by_id() {
        let mut app = app();
        app.product_detail = Some(ProductDetail {
            product: product("1", "Sofá", 150050, "moveis"),
            views: None,
            loading: true,
        });

        app.process_load_result(LoadResult::ProductDetail {
            id: "2".to_string(),
            product: Err("stale".to_string()),
            views: Ok(9),
        });
        assert!(app.product_detail.as_ref().unwrap().loading);

        app.process_load_result(LoadResult::ProductDetail {
            id: "1".to_string(),
            product: Ok(product("1", "Sofá retrátil", 150050, "moveis")),
            views: Err(PRODUCT_VIEWS_FALLBACK.to_string()),
        });
        let detail = app.product_detail.as_ref().unwrap();
        assert!(!detail.loading);
        assert_eq!(detail.product.title, "Sofá retrátil");
        assert!(detail.views.is_none());
        assert_eq!(
            app.status_message.as_ref().map(|m| m.text.as_str()),
            Some(PRODUCT_VIEWS_FALLBACK)
        );
    }

    #[tokio::test]
    async fn test_failed_product_load_keeps_list() {
        let mut app = app();
        app.loading_products = true;
        app.process_load_result(LoadResult::Products(Err(PRODUCTS_FALLBACK.to_string())));
        assert!(!app.loading_products);
        assert_eq!(visible_ids(&app).len(), 3);
        assert_eq!(app.status_message.as_ref().unwrap().kind, StatusKind::Error);
    }

    #[tokio::test]
    async fn test_server_sign_out_returns_to_sign_in() {
        let mut app = app();
        // The session was never authenticated, as after a 401 sign-out
        app.sync_session().await;
        assert!(app.seller.is_none());
        assert_eq!(app.state, AppState::SigningIn);
        assert!(app.visible_products().is_empty());
    }

    #[tokio::test]
    async fn test_late_product_load_after_sign_out_is_dropped() {
        let mut app = app();
        app.loading_products = true;
        app.on_signed_out();

        app.process_load_result(LoadResult::Products(Ok(vec![product(
            "1", "Sofá", 150050, "moveis",
        )])));
        app.process_load_result(LoadResult::Categories(Ok(vec![Category {
            id: "c-1".to_string(),
            title: "Móveis".to_string(),
            slug: "moveis".to_string(),
        }])));

        assert!(app.products.products().is_empty());
        assert!(app.visible_products().is_empty());
        assert!(app.categories.is_empty());
        assert_eq!(app.state, AppState::SigningIn);
    }

    #[tokio::test]
    async fn test_forget_credentials_clears_password() {
        let mut app = app();
        app.sign_in_form.set(Field::Email, "ana@example.com");
        app.sign_in_form.set(Field::Password, "hunter2");

        app.forget_credentials("ana@example.com");

        assert_eq!(app.sign_in_form.value(Field::Password), "");
        assert_eq!(app.sign_in_form.value(Field::Email), "ana@example.com");
        assert!(!CredentialStore::has_credentials("ana@example.com"));
    }

    #[tokio::test]
    async fn test_only_one_action_is_queued() {
        let mut app = app();
        app.request(PendingAction::UpdateProfile);
        app.request(PendingAction::SignOut);
        assert!(app.is_busy());
        assert_eq!(app.pending_action, Some(PendingAction::UpdateProfile));
    }

    #[tokio::test]
    async fn test_sign_in_validation_stays_local() {
        let mut app = app();
        app.seller = None;
        app.start_sign_in();
        app.request(PendingAction::SignIn);
        app.run_pending_action().await;
        assert!(!app.is_busy());
        assert_eq!(
            app.sign_in_form.error(Field::Email),
            Some("Please enter your email")
        );
        assert_eq!(app.sign_in_form.focused(), Some(Field::Email));
        assert_eq!(app.state, AppState::SigningIn);
    }
}
