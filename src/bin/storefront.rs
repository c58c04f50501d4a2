//! CLI front end for the storefront: browse, fill a cart, check out.

use std::io::{self, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, Table};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use storefront_rs::cart::CartStore;
use storefront_rs::client::StorefrontBlockingClient;
use storefront_rs::error::StorefrontError;
use storefront_rs::messages;
use storefront_rs::models::{
    CartEntry, Credentials, OrderSummary, Product, ProductDraft, ProductFilter, ProductId,
    ProductPage, Role, ShippingAddress, SortOrder, ToastKind, UserUpdate,
};
use storefront_rs::routes::{self, Route};
use storefront_rs::session::SessionStore;
use storefront_rs::storage::{FileStorage, KeyValueStorage};
use storefront_rs::toast::{NotificationQueue, Toast};
use storefront_rs::validation;

/// Environment variable overriding the API base URL.
const API_URL_ENV: &str = "STOREFRONT_API_URL";

/// Storefront CLI: sign in, browse products, manage a cart.
#[derive(Debug, Parser)]
#[command(name = "storefront", version, about)]
struct Cli {
    /// Override the storage directory (default: XDG data dir).
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Override the API base URL (also read from STOREFRONT_API_URL).
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the backend is reachable.
    Health,
    /// Sign in with email and password.
    Login(LoginArgs),
    /// Create an account and sign in.
    Register(RegisterArgs),
    /// Sign out and forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami {
        /// Refresh the stored profile from the backend.
        #[arg(long)]
        refresh: bool,
    },
    /// Browse the product catalogue.
    Products(ProductArgs),
    /// Inspect or change the cart.
    #[command(subcommand)]
    Cart(CartCommand),
    /// Place an order for everything in the cart.
    Checkout(AddressArgs),
    /// Manage your products (merchants only).
    #[command(subcommand)]
    Merchant(MerchantCommand),
}

/// Arguments for the `login` subcommand.
#[derive(Debug, Args)]
struct LoginArgs {
    /// Account email.
    #[arg(long)]
    email: String,
    /// Account password.
    #[arg(long)]
    password: String,
}

/// Arguments for the `register` subcommand.
#[derive(Debug, Args)]
struct RegisterArgs {
    /// Display name.
    #[arg(long)]
    name: String,
    /// Account email.
    #[arg(long)]
    email: String,
    /// Account password.
    #[arg(long)]
    password: String,
    /// Password confirmation (defaults to --password).
    #[arg(long)]
    confirm_password: Option<String>,
    /// Register a merchant account.
    #[arg(long)]
    merchant: bool,
}

/// Sort direction accepted on the command line.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortArg {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Asc => Self::Asc,
            SortArg::Desc => Self::Desc,
        }
    }
}

/// Listing filters shared by `products` and `merchant list`.
#[derive(Debug, Args)]
struct ProductArgs {
    /// Free-text search.
    #[arg(long)]
    search: Option<String>,
    /// Category name.
    #[arg(long)]
    category: Option<String>,
    /// Lowest price.
    #[arg(long)]
    min_price: Option<f64>,
    /// Highest price.
    #[arg(long)]
    max_price: Option<f64>,
    /// Field to sort by.
    #[arg(long, default_value = "createdAt")]
    sort_by: String,
    /// Sort direction.
    #[arg(long, value_enum, default_value = "desc")]
    order: SortArg,
    /// Page number (1-based).
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Page size.
    #[arg(long, default_value_t = storefront_rs::models::DEFAULT_PAGE_SIZE)]
    limit: u32,
}

impl ProductArgs {
    /// Converts the arguments into a [`ProductFilter`].
    fn to_filter(&self) -> ProductFilter {
        let mut filter = ProductFilter::new()
            .price_range(self.min_price, self.max_price)
            .sort(self.sort_by.clone(), self.order.into());
        if let Some(term) = self.search.as_deref() {
            filter = filter.search(term);
        }
        if let Some(name) = self.category.as_deref() {
            filter = filter.category(name);
        }
        filter.page(self.page).limit(self.limit)
    }
}

/// `cart` subcommands.
#[derive(Debug, Subcommand)]
enum CartCommand {
    /// Show the cart.
    Show,
    /// Add one unit of a product.
    Add {
        /// Product id.
        product_id: String,
    },
    /// Remove a product entirely.
    Remove {
        /// Product id.
        product_id: String,
    },
    /// Set the quantity of a product already in the cart.
    Set {
        /// Product id.
        product_id: String,
        /// New quantity (at least 1).
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart.
    Clear,
}

/// Shipping address for `checkout`.
#[derive(Debug, Args)]
struct AddressArgs {
    /// Recipient name.
    #[arg(long, default_value = "")]
    full_name: String,
    /// Street and number.
    #[arg(long, default_value = "")]
    street: String,
    /// City.
    #[arg(long, default_value = "")]
    city: String,
    /// State or region.
    #[arg(long, default_value = "")]
    state: String,
    /// Postal code.
    #[arg(long, default_value = "")]
    zip_code: String,
    /// Contact phone.
    #[arg(long, default_value = "")]
    phone: String,
}

impl From<AddressArgs> for ShippingAddress {
    fn from(args: AddressArgs) -> Self {
        Self {
            full_name: args.full_name,
            street: args.street,
            city: args.city,
            state: args.state,
            zip_code: args.zip_code,
            phone: args.phone,
        }
    }
}

/// `merchant` subcommands.
#[derive(Debug, Subcommand)]
enum MerchantCommand {
    /// List your products.
    List(ProductArgs),
    /// Create a product.
    Create(DraftArgs),
    /// Change fields of one of your products.
    Update {
        /// Product id.
        product_id: String,
        /// Fields to change.
        #[command(flatten)]
        changes: DraftChanges,
    },
    /// Delete one of your products.
    Delete {
        /// Product id.
        product_id: String,
    },
}

/// Fields of a new product.
#[derive(Debug, Args)]
struct DraftArgs {
    /// Title (at least 3 characters).
    #[arg(long)]
    title: String,
    /// Description (at least 10 characters).
    #[arg(long)]
    description: String,
    /// Unit price.
    #[arg(long)]
    price: f64,
    /// Category name.
    #[arg(long)]
    category: String,
}

/// Optional product field overrides.
#[derive(Debug, Args)]
struct DraftChanges {
    /// New title.
    #[arg(long)]
    title: Option<String>,
    /// New description.
    #[arg(long)]
    description: Option<String>,
    /// New price.
    #[arg(long)]
    price: Option<f64>,
    /// New category.
    #[arg(long)]
    category: Option<String>,
}

impl DraftChanges {
    /// Applies the set fields on top of `draft`.
    fn apply(self, mut draft: ProductDraft) -> ProductDraft {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(price) = self.price {
            draft.price = price;
        }
        if let Some(category) = self.category {
            draft.category = category;
        }
        draft
    }
}

/// Session, cart and notifications sharing one storage backend.
#[derive(Debug)]
struct App<S: KeyValueStorage + Clone> {
    /// Signed-in state.
    session: SessionStore<S>,
    /// Shopping cart.
    cart: CartStore<S>,
    /// Messages printed after each command.
    notices: NotificationQueue,
    /// API base URL override.
    api_url: Option<String>,
}

impl<S: KeyValueStorage + Clone> App<S> {
    /// Restores session and cart from `storage`, dropping an expired
    /// session.
    fn open(storage: &S, api_url: Option<String>) -> Self {
        let mut app = Self {
            session: SessionStore::new(storage.clone()),
            cart: CartStore::new(storage.clone()),
            notices: NotificationQueue::new(),
            api_url,
        };
        if app.session.initialize() {
            let validity = app.session.check_token_validity(&mut app.notices);
            tracing::debug!(?validity, "checked stored token");
        }
        let restored = app.cart.load();
        tracing::debug!(restored, "cart restored");
        app
    }

    /// Builds an API client carrying the session token, if any.
    fn client(&self) -> storefront_rs::error::Result<StorefrontBlockingClient> {
        let mut builder = StorefrontBlockingClient::builder();
        if let Some(url) = self.api_url.as_deref() {
            builder = builder.base_url(url);
        }
        if let Some(token) = self.session.bearer_token() {
            builder = builder.token(token);
        }
        builder.build()
    }

    /// Queues the user-facing message for `err`; a rejected token also
    /// ends the session.
    fn fail(&mut self, err: &StorefrontError) -> ExitCode {
        tracing::debug!(error = %err, "command failed");
        if err.is_unauthorized() {
            self.session.handle_unauthorized(&mut self.notices);
        } else {
            let _toast = self.notices.show_error(err.user_message());
        }
        ExitCode::FAILURE
    }

    /// Queues one error toast per validation failure.
    fn reject(&mut self, errors: &[storefront_rs::error::ValidationError]) -> ExitCode {
        for err in errors {
            let label = err.field().unwrap_or("input");
            let _toast = self.notices.show_error(format!("{label}: {err}"));
        }
        ExitCode::FAILURE
    }

    /// Checks access to `route`, queueing a warning when redirected.
    fn allowed(&mut self, route: Route) -> bool {
        let target = routes::resolve(route, &self.session);
        if target == route {
            return true;
        }
        let reason = if target == Route::Login {
            messages::error::LOGIN_REQUIRED
        } else {
            messages::error::UNAUTHORIZED
        };
        let _toast = self.notices.show_warning(reason);
        tracing::debug!(%route, %target, "route redirected");
        false
    }

    /// Prints and drains every queued toast.
    fn flush_toasts(&mut self) -> io::Result<()> {
        let expired = self.notices.run_due_timers();
        tracing::trace!(expired = expired.len(), "expired toasts");
        print_toasts(&self.notices.take_toasts())
    }
}

/// Resolves the API URL from the flag, then the environment.
fn resolve_api_url(flag: Option<String>) -> Option<String> {
    flag.or_else(|| std::env::var(API_URL_ENV).ok().filter(|url| !url.is_empty()))
}

/// Runs the CLI, returning an appropriate exit code.
fn run() -> io::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let _dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let storage = match create_storage(cli.data_dir) {
        Ok(storage) => Arc::new(storage),
        Err(err) => {
            writeln!(
                io::stderr().lock(),
                "{} failed to initialize storage: {err}",
                "error:".red().bold()
            )?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let mut app = App::open(&storage, resolve_api_url(cli.api_url));
    let code = dispatch(&mut app, cli.command)?;
    app.flush_toasts()?;
    Ok(code)
}

/// Creates the storage backend, using `data_dir` if provided or the
/// default XDG data directory otherwise.
fn create_storage(data_dir: Option<PathBuf>) -> storefront_rs::error::Result<FileStorage> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => FileStorage::default_dir()?,
    };
    FileStorage::new(dir)
}

/// Dispatches to the appropriate subcommand handler.
fn dispatch<S: KeyValueStorage + Clone>(app: &mut App<S>, command: Command) -> io::Result<ExitCode> {
    match command {
        Command::Health => cmd_health(app),
        Command::Login(args) => cmd_login(app, args),
        Command::Register(args) => cmd_register(app, args),
        Command::Logout => {
            app.session.logout(&mut app.notices);
            Ok(ExitCode::SUCCESS)
        }
        Command::Whoami { refresh } => cmd_whoami(app, refresh),
        Command::Products(args) => cmd_products(app, &args),
        Command::Cart(cart) => cmd_cart(app, cart),
        Command::Checkout(address) => cmd_checkout(app, address.into()),
        Command::Merchant(merchant) => cmd_merchant(app, merchant),
    }
}

/// Executes the `health` subcommand.
fn cmd_health<S: KeyValueStorage + Clone>(app: &mut App<S>) -> io::Result<ExitCode> {
    let spinner = make_spinner("Contacting storefront API...");
    let result = app.client().and_then(|client| client.health());
    spinner.finish_and_clear();
    match result {
        Ok(status) => {
            let detail = status.message.unwrap_or_else(|| "ok".to_owned());
            writeln!(io::stdout().lock(), "{} {detail}", "API is up:".green().bold())?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(app.fail(&err)),
    }
}

/// Executes the `login` subcommand.
fn cmd_login<S: KeyValueStorage + Clone>(app: &mut App<S>, args: LoginArgs) -> io::Result<ExitCode> {
    if !app.allowed(Route::Login) {
        return Ok(ExitCode::FAILURE);
    }
    let credentials = Credentials {
        email: args.email.trim().to_owned(),
        password: args.password,
    };
    let errors = validation::validate_credentials(&credentials);
    if !errors.is_empty() {
        return Ok(app.reject(&errors));
    }

    let spinner = make_spinner(messages::info::LOGGING_IN);
    let result = app
        .client()
        .and_then(|client| client.login(&credentials))
        .and_then(storefront_rs::models::AuthResponse::into_session);
    spinner.finish_and_clear();
    match result {
        Ok((user, token)) => finish_sign_in(app, |session, notices| {
            session.login(user, token, notices)
        }),
        Err(err) => Ok(app.fail(&err)),
    }
}

/// Executes the `register` subcommand.
fn cmd_register<S: KeyValueStorage + Clone>(
    app: &mut App<S>,
    args: RegisterArgs,
) -> io::Result<ExitCode> {
    if !app.allowed(Route::Register) {
        return Ok(ExitCode::FAILURE);
    }
    let confirm = args.confirm_password.unwrap_or_else(|| args.password.clone());
    let registration = storefront_rs::models::Registration {
        name: args.name.trim().to_owned(),
        email: args.email.trim().to_owned(),
        password: args.password,
        role: if args.merchant { Role::Merchant } else { Role::Customer },
    };
    let errors = validation::validate_registration(&registration, &confirm);
    if !errors.is_empty() {
        return Ok(app.reject(&errors));
    }

    let spinner = make_spinner(messages::info::REGISTERING);
    let result = app
        .client()
        .and_then(|client| client.register(&registration))
        .and_then(storefront_rs::models::AuthResponse::into_session);
    spinner.finish_and_clear();
    match result {
        Ok((user, token)) => finish_sign_in(app, |session, notices| {
            session.register(user, token, notices)
        }),
        Err(err) => Ok(app.fail(&err)),
    }
}

/// Adopts a fresh session and prints where the user would land next.
fn finish_sign_in<S, F>(app: &mut App<S>, establish: F) -> io::Result<ExitCode>
where
    S: KeyValueStorage + Clone,
    F: FnOnce(&mut SessionStore<S>, &mut NotificationQueue) -> bool,
{
    if !establish(&mut app.session, &mut app.notices) {
        return Ok(ExitCode::FAILURE);
    }
    let next = routes::post_login_destination(&app.cart);
    let hint = match next {
        Route::Checkout => "items are waiting in your cart, run `storefront checkout`",
        Route::Home
        | Route::Products
        | Route::Login
        | Route::Register
        | Route::Dashboard
        | Route::MerchantDashboard => "browse with `storefront products`",
    };
    writeln!(io::stdout().lock(), "{} {hint}", "next:".cyan())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `whoami` subcommand.
fn cmd_whoami<S: KeyValueStorage + Clone>(app: &mut App<S>, refresh: bool) -> io::Result<ExitCode> {
    if !app.allowed(Route::Dashboard) {
        return Ok(ExitCode::FAILURE);
    }
    if refresh {
        let spinner = make_spinner("Refreshing profile...");
        let result = app.client().and_then(|client| client.profile());
        spinner.finish_and_clear();
        match result {
            Ok(profile) => {
                let update = UserUpdate::new()
                    .name(profile.user.name)
                    .email(profile.user.email)
                    .role(profile.user.role);
                if app.session.update_user(update) {
                    let _toast = app.notices.show_success(messages::success::PROFILE_UPDATED);
                }
            }
            Err(err) => return Ok(app.fail(&err)),
        }
    }
    let Some(user) = app.session.user() else {
        return Ok(ExitCode::FAILURE);
    };
    let mut out = io::stdout().lock();
    writeln!(out, "{} {}", "Signed in as".green().bold(), user.name.bold())?;
    writeln!(out, "  {} {}", "Email:".bold(), user.email)?;
    writeln!(out, "  {} {}", "Role:".bold(), user.role)?;
    writeln!(out, "  {} {}", "Cart:".bold(), app.cart.cart_count())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `products` subcommand.
fn cmd_products<S: KeyValueStorage + Clone>(
    app: &mut App<S>,
    args: &ProductArgs,
) -> io::Result<ExitCode> {
    let filter = args.to_filter();
    let spinner = make_spinner(messages::info::LOADING_PRODUCTS);
    let result = app.client().and_then(|client| client.products(&filter));
    spinner.finish_and_clear();
    match result {
        Ok(page) => {
            print_products_table("Products", &page, &filter)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(app.fail(&err)),
    }
}

/// Executes a `cart` subcommand.
fn cmd_cart<S: KeyValueStorage + Clone>(app: &mut App<S>, command: CartCommand) -> io::Result<ExitCode> {
    match command {
        CartCommand::Show => {}
        CartCommand::Add { product_id } => {
            let spinner = make_spinner("Looking up product...");
            let id = ProductId::new(product_id);
            let result = app.client().and_then(|client| client.product(&id));
            spinner.finish_and_clear();
            match result {
                Ok(product) => {
                    let _quantity = app.cart.add_to_cart_with_notice(&product, &mut app.notices);
                }
                Err(err) => return Ok(app.fail(&err)),
            }
        }
        CartCommand::Remove { product_id } => {
            if !app.cart.remove_from_cart(&ProductId::new(product_id)) {
                let _toast = app.notices.show_warning("That product is not in your cart");
                return Ok(ExitCode::FAILURE);
            }
        }
        CartCommand::Set {
            product_id,
            quantity,
        } => match app.cart.update_quantity(&ProductId::new(product_id), quantity) {
            Ok(true) => {}
            Ok(false) => {
                let _toast = app.notices.show_warning("That product is not in your cart");
                return Ok(ExitCode::FAILURE);
            }
            Err(err) => return Ok(app.fail(&err)),
        },
        CartCommand::Clear => app.cart.clear_cart(),
    }
    print_cart_table(app.cart.entries(), app.cart.cart_total())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `checkout` subcommand.
fn cmd_checkout<S: KeyValueStorage + Clone>(
    app: &mut App<S>,
    address: ShippingAddress,
) -> io::Result<ExitCode> {
    if !app.allowed(Route::Checkout) {
        return Ok(ExitCode::FAILURE);
    }
    let errors = validation::validate_shipping_address(&address);
    if !errors.is_empty() {
        return Ok(app.reject(&errors));
    }
    let processing = app.notices.show_loading(messages::info::PROCESSING);
    let result = app.cart.checkout(address, &mut app.notices);
    let _removed = app.notices.remove_toast(processing);
    match result {
        Ok(summary) => {
            print_order_summary(&summary)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            tracing::debug!(error = %err, "checkout failed");
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Executes a `merchant` subcommand.
fn cmd_merchant<S: KeyValueStorage + Clone>(
    app: &mut App<S>,
    command: MerchantCommand,
) -> io::Result<ExitCode> {
    if !app.allowed(Route::MerchantDashboard) {
        return Ok(ExitCode::FAILURE);
    }
    match command {
        MerchantCommand::List(args) => {
            let filter = args.to_filter();
            let spinner = make_spinner(messages::info::LOADING_PRODUCTS);
            let result = app.client().and_then(|client| client.merchant_products(&filter));
            spinner.finish_and_clear();
            match result {
                Ok(page) => {
                    print_products_table("Your products", &page, &filter)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => Ok(app.fail(&err)),
            }
        }
        MerchantCommand::Create(args) => {
            let draft = ProductDraft {
                title: args.title,
                description: args.description,
                price: args.price,
                category: args.category,
            };
            save_product(app, None, &draft)
        }
        MerchantCommand::Update {
            product_id,
            changes,
        } => {
            let id = ProductId::new(product_id);
            let current = app.client().and_then(|client| client.product(&id));
            match current {
                Ok(product) => {
                    let draft = changes.apply(ProductDraft::from(&product));
                    save_product(app, Some(&id), &draft)
                }
                Err(err) => Ok(app.fail(&err)),
            }
        }
        MerchantCommand::Delete { product_id } => {
            let id = ProductId::new(product_id);
            let loading = app.notices.show_loading(messages::info::PROCESSING);
            match app.client().and_then(|client| client.delete_product(&id)) {
                Ok(_) => {
                    let _updated = app.notices.update_loading_toast(
                        loading,
                        messages::success::PRODUCT_DELETED,
                        ToastKind::Success,
                    );
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => {
                    let _removed = app.notices.remove_toast(loading);
                    Ok(app.fail(&err))
                }
            }
        }
    }
}

/// Validates and sends a product create (`id` is `None`) or update.
fn save_product<S: KeyValueStorage + Clone>(
    app: &mut App<S>,
    id: Option<&ProductId>,
    draft: &ProductDraft,
) -> io::Result<ExitCode> {
    let errors = validation::validate_product_draft(draft);
    if !errors.is_empty() {
        return Ok(app.reject(&errors));
    }
    let loading = app.notices.show_loading(messages::info::SAVING_PRODUCT);
    let result = app.client().and_then(|client| match id {
        Some(id) => client.update_product(id, draft),
        None => client.create_product(draft),
    });
    match result {
        Ok(product) => {
            let message = if id.is_some() {
                messages::success::PRODUCT_UPDATED
            } else {
                messages::success::PRODUCT_CREATED
            };
            let _updated = app
                .notices
                .update_loading_toast(loading, message, ToastKind::Success);
            print_product_detail(&product)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let _removed = app.notices.remove_toast(loading);
            Ok(app.fail(&err))
        }
    }
}

// ── Output formatting ────────────────────────────────────────────────

/// Prints toasts, errors and warnings to stderr and the rest to stdout.
fn print_toasts(toasts: &[Toast]) -> io::Result<()> {
    for toast in toasts {
        match toast.kind {
            ToastKind::Error => {
                writeln!(io::stderr().lock(), "{} {}", "error:".red().bold(), toast.message)?;
            }
            ToastKind::Warning => {
                writeln!(io::stderr().lock(), "{} {}", "warning:".yellow().bold(), toast.message)?;
            }
            ToastKind::Success => {
                writeln!(io::stdout().lock(), "{} {}", "ok:".green().bold(), toast.message)?;
            }
            ToastKind::Info | ToastKind::Loading => {
                writeln!(io::stdout().lock(), "{} {}", "info:".cyan(), toast.message)?;
            }
        }
    }
    Ok(())
}

/// Prints one page of products in a table.
fn print_products_table(title: &str, page: &ProductPage, filter: &ProductFilter) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if page.products.is_empty() {
        writeln!(out, "{}", "No products found.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Id").fg(Color::Cyan),
        Cell::new("Title").fg(Color::Cyan),
        Cell::new("Category").fg(Color::Cyan),
        Cell::new("Price").fg(Color::Cyan),
    ]);

    for product in &page.products {
        _ = table.add_row(vec![
            Cell::new(product.id.as_str()).fg(Color::DarkGrey),
            Cell::new(&product.title),
            Cell::new(&product.category),
            Cell::new(format!("{:.2}", product.price)).fg(Color::Green),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        title.green().bold(),
        format_args!(
            "(page {} of {}, {} total)",
            filter.page,
            page.total_pages(filter.limit),
            page.total()
        )
        .dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    Ok(())
}

/// Prints the fields of a single product.
fn print_product_detail(product: &Product) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{} {}", product.title.bold(), format_args!("({})", product.id).dimmed())?;
    writeln!(out, "  {} {:.2}", "Price:".bold(), product.price)?;
    writeln!(out, "  {} {}", "Category:".bold(), product.category)?;
    if !product.description.is_empty() {
        writeln!(out, "  {} {}", "Description:".bold(), product.description)?;
    }
    Ok(())
}

/// Prints the cart in a table.
fn print_cart_table(entries: &[CartEntry], total: f64) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if entries.is_empty() {
        writeln!(out, "{}", "Your cart is empty.".dimmed())?;
        return Ok(());
    }

    let mut table = Table::new();
    _ = table.load_preset(UTF8_FULL);
    _ = table.set_header(vec![
        Cell::new("Id").fg(Color::Cyan),
        Cell::new("Title").fg(Color::Cyan),
        Cell::new("Price").fg(Color::Cyan),
        Cell::new("Qty").fg(Color::Cyan),
        Cell::new("Line total").fg(Color::Cyan),
    ]);

    for entry in entries {
        _ = table.add_row(vec![
            Cell::new(entry.product_id.as_str()).fg(Color::DarkGrey),
            Cell::new(&entry.title),
            Cell::new(format!("{:.2}", entry.price)),
            Cell::new(entry.quantity),
            Cell::new(format!("{:.2}", entry.line_total())).fg(Color::Green),
        ]);
    }

    writeln!(
        out,
        "{} {}",
        "Cart".green().bold(),
        format_args!("({} items)", entries.len()).dimmed()
    )?;
    writeln!(out)?;
    writeln!(out, "{table}")?;
    writeln!(out, "{} {total:.2}", "Total:".bold())?;
    Ok(())
}

/// Prints a placed order.
fn print_order_summary(summary: &OrderSummary) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "{}", "Order placed".green().bold())?;
    for entry in &summary.entries {
        writeln!(out, "  {} x {} {:.2}", entry.quantity, entry.title, entry.line_total())?;
    }
    writeln!(out, "  {} {:.2}", "Total:".bold(), summary.total)?;
    writeln!(
        out,
        "  {} {}, {}, {}, {} {}",
        "Ship to:".bold(),
        summary.address.full_name,
        summary.address.street,
        summary.address.city,
        summary.address.state,
        summary.address.zip_code
    )?;
    Ok(())
}

/// Creates a spinner with the given message.
fn make_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(core::time::Duration::from_millis(80));
    spinner
}

/// Entry point.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            // If stderr itself failed there is nowhere left to report to.
            let _ignored = writeln!(io::stderr(), "fatal I/O error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use storefront_rs::models::{User, UserId};
    use storefront_rs::storage::InMemoryStorage;

    type TestApp = App<Arc<InMemoryStorage>>;

    /// Points at a port nothing listens on so network commands fail fast.
    const DEAD_API: &str = "http://127.0.0.1:9";

    fn app() -> (TestApp, Arc<InMemoryStorage>) {
        let storage = Arc::new(InMemoryStorage::new());
        (App::open(&storage, Some(DEAD_API.to_owned())), storage)
    }

    fn sign_in(app: &mut TestApp, role: Role) {
        let user = User {
            id: UserId::new("u1"),
            name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
            role,
        };
        assert!(app.session.login(user, "h.e30.s", &mut app.notices));
        app.notices.clear_toasts();
    }

    fn lamp(id: &str) -> Product {
        Product {
            id: ProductId::new(id),
            title: "Desk lamp".to_owned(),
            description: "Warm light".to_owned(),
            price: 12.5,
            category: "Home".to_owned(),
            merchant: None,
        }
    }

    fn address() -> AddressArgs {
        AddressArgs {
            full_name: "Ada Lovelace".to_owned(),
            street: "1 Analytical Way".to_owned(),
            city: "London".to_owned(),
            state: "LDN".to_owned(),
            zip_code: "N1".to_owned(),
            phone: "555-0100".to_owned(),
        }
    }

    // ── argument parsing ─────────────────────────────────────────────

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::try_parse_from([
            "storefront",
            "--api-url",
            "http://localhost:5000/api",
            "cart",
            "set",
            "p1",
            "-2",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://localhost:5000/api"));
        assert!(matches!(
            cli.command,
            Command::Cart(CartCommand::Set { quantity: -2, .. })
        ));
    }

    #[test]
    fn product_args_build_filter() {
        let cli = Cli::try_parse_from([
            "storefront",
            "products",
            "--search",
            "lamp",
            "--min-price",
            "5",
            "--order",
            "asc",
            "--page",
            "3",
        ])
        .unwrap();
        let Command::Products(args) = cli.command else {
            panic!("expected products command");
        };
        let filter = args.to_filter();
        assert_eq!(filter.q.as_deref(), Some("lamp"));
        assert_eq!(filter.min_price, Some(5.0));
        assert_eq!(filter.sort_order, SortOrder::Asc);
        assert_eq!(filter.page, 3);
    }

    #[test]
    fn draft_changes_only_touch_set_fields() {
        let changes = DraftChanges {
            title: None,
            description: None,
            price: Some(20.0),
            category: Some("Office".to_owned()),
        };
        let draft = changes.apply(ProductDraft::from(&lamp("p1")));
        assert_eq!(draft.title, "Desk lamp");
        assert_eq!(draft.category, "Office");
        assert!((draft.price - 20.0).abs() < f64::EPSILON);
    }

    // ── offline commands ─────────────────────────────────────────────

    #[test]
    fn cart_commands_edit_persisted_cart() {
        let (mut app, storage) = app();
        let _quantity = app.cart.add_to_cart(&lamp("p1"));

        let set = CartCommand::Set {
            product_id: "p1".to_owned(),
            quantity: 3,
        };
        assert_eq!(cmd_cart(&mut app, set).unwrap(), ExitCode::SUCCESS);

        let reopened = App::open(&storage, None);
        assert_eq!(reopened.cart.cart_count(), 3);

        assert_eq!(cmd_cart(&mut app, CartCommand::Clear).unwrap(), ExitCode::SUCCESS);
        assert!(app.cart.is_empty());
    }

    #[test]
    fn cart_set_rejects_zero() {
        let (mut app, _storage) = app();
        let _quantity = app.cart.add_to_cart(&lamp("p1"));
        let set = CartCommand::Set {
            product_id: "p1".to_owned(),
            quantity: 0,
        };
        assert_eq!(cmd_cart(&mut app, set).unwrap(), ExitCode::FAILURE);
        assert_eq!(app.cart.cart_count(), 1);
        assert_eq!(app.notices.toasts()[0].kind, ToastKind::Error);
    }

    #[test]
    fn cart_remove_unknown_product_fails() {
        let (mut app, _storage) = app();
        let remove = CartCommand::Remove {
            product_id: "ghost".to_owned(),
        };
        assert_eq!(cmd_cart(&mut app, remove).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn checkout_requires_login() {
        let (mut app, _storage) = app();
        let _quantity = app.cart.add_to_cart(&lamp("p1"));
        assert_eq!(cmd_checkout(&mut app, address().into()).unwrap(), ExitCode::FAILURE);
        assert_eq!(app.cart.len(), 1);
        assert_eq!(app.notices.toasts()[0].message, messages::error::LOGIN_REQUIRED);
    }

    #[test]
    fn checkout_places_order_for_customer() {
        let (mut app, _storage) = app();
        sign_in(&mut app, Role::Customer);
        let _quantity = app.cart.add_to_cart(&lamp("p1"));
        assert_eq!(cmd_checkout(&mut app, address().into()).unwrap(), ExitCode::SUCCESS);
        assert!(app.cart.is_empty());
        let shown: Vec<&str> = app
            .notices
            .toasts()
            .iter()
            .map(|toast| toast.message.as_str())
            .collect();
        assert_eq!(shown, [messages::success::ORDER_PLACED]);
    }

    #[test]
    fn checkout_reports_missing_address_fields() {
        let (mut app, _storage) = app();
        sign_in(&mut app, Role::Customer);
        let _quantity = app.cart.add_to_cart(&lamp("p1"));
        let address = ShippingAddress {
            phone: String::new(),
            ..ShippingAddress::from(address())
        };
        assert_eq!(cmd_checkout(&mut app, address).unwrap(), ExitCode::FAILURE);
        assert_eq!(app.cart.len(), 1);
        assert_eq!(app.notices.toasts()[0].message, "phone: This field is required");
    }

    #[test]
    fn merchant_commands_need_a_merchant() {
        let (mut app, _storage) = app();
        sign_in(&mut app, Role::Customer);
        let code = cmd_merchant(
            &mut app,
            MerchantCommand::Delete {
                product_id: "p1".to_owned(),
            },
        )
        .unwrap();
        assert_eq!(code, ExitCode::FAILURE);
        assert_eq!(app.notices.toasts()[0].message, messages::error::UNAUTHORIZED);
    }

    #[test]
    fn invalid_draft_is_rejected_before_any_request() {
        let (mut app, _storage) = app();
        sign_in(&mut app, Role::Merchant);
        let create = MerchantCommand::Create(DraftArgs {
            title: "Hi".to_owned(),
            description: "Too short".to_owned(),
            price: 1.0,
            category: "Home".to_owned(),
        });
        assert_eq!(cmd_merchant(&mut app, create).unwrap(), ExitCode::FAILURE);
        assert_eq!(app.notices.len(), 2);
    }

    #[test]
    fn login_is_refused_when_signed_in() {
        let (mut app, _storage) = app();
        sign_in(&mut app, Role::Customer);
        let args = LoginArgs {
            email: "ada@example.com".to_owned(),
            password: "secret1".to_owned(),
        };
        assert_eq!(cmd_login(&mut app, args).unwrap(), ExitCode::FAILURE);
    }

    #[test]
    fn login_validates_before_calling_api() {
        let (mut app, _storage) = app();
        let args = LoginArgs {
            email: "not-an-email".to_owned(),
            password: String::new(),
        };
        assert_eq!(cmd_login(&mut app, args).unwrap(), ExitCode::FAILURE);
        assert_eq!(app.notices.len(), 2);
    }

    #[test]
    fn logout_clears_session() {
        let (mut app, storage) = app();
        sign_in(&mut app, Role::Customer);
        assert_eq!(dispatch(&mut app, Command::Logout).unwrap(), ExitCode::SUCCESS);
        assert!(!app.session.is_authenticated());
        assert!(storage.get("token").unwrap().is_none());
    }

    #[test]
    fn whoami_prints_signed_in_user() {
        let (mut app, _storage) = app();
        sign_in(&mut app, Role::Merchant);
        assert_eq!(cmd_whoami(&mut app, false).unwrap(), ExitCode::SUCCESS);
    }

    #[test]
    fn health_against_dead_api_is_a_network_error() {
        let (mut app, _storage) = app();
        assert_eq!(cmd_health(&mut app).unwrap(), ExitCode::FAILURE);
        assert_eq!(app.notices.toasts()[0].message, messages::error::NETWORK_ERROR);
    }

    #[test]
    fn expired_session_is_dropped_on_open() {
        let storage = Arc::new(InMemoryStorage::new());
        storage.set("token", "not-a-jwt").unwrap();
        storage
            .set("user", r#"{"id":"u1","name":"Ada","email":"ada@example.com"}"#)
            .unwrap();
        let app = App::open(&storage, None);
        assert!(!app.session.is_authenticated());
        assert_eq!(app.notices.toasts()[0].message, messages::error::TOKEN_EXPIRED);
    }

    // ── output ───────────────────────────────────────────────────────

    #[test]
    fn print_helpers_handle_empty_and_full_input() {
        print_cart_table(&[], 0.0).unwrap();
        let entry = CartEntry::from_product(&lamp("p1"));
        print_cart_table(&[entry], 12.5).unwrap();
        print_products_table("Products", &ProductPage::default(), &ProductFilter::new()).unwrap();
        print_product_detail(&lamp("p1")).unwrap();
        print_toasts(&[]).unwrap();
    }

    #[test]
    fn make_spinner_creates_spinner() {
        let spinner = make_spinner("Testing...");
        spinner.finish_and_clear();
    }
}
