mod demo;
mod render;
mod session_store;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sellerdesk_core::ConsoleConfig;
use sellerdesk_core::app::{SellerConsole, status_actions};
use sellerdesk_core::domain::{
    ProductFilter, ProductForm, ProductId, ProductStatus, RegistrationForm,
    SessionState, SignInForm, Upload,
};
use sellerdesk_core::impls::{HttpMarketplaceApi, InMemoryResponseCache};

use crate::render::ConsoleNotifier;
use crate::session_store::SessionStore;

#[derive(Parser, Debug)]
#[command(name = "sellerdesk")]
#[command(about = "Seller console for the marketplace API")]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API base URL, overrides the config file
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scripted session against an in-memory marketplace
    Demo,
    #[command(flatten)]
    Remote(RemoteCommand),
}

/// API サーバーに対するコマンド
#[derive(Subcommand, Debug)]
enum RemoteCommand {
    /// Create a seller account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        password_confirmation: String,
        /// Profile picture
        #[arg(long)]
        avatar: Option<PathBuf>,
    },
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    SignOut,
    /// Show the signed-in seller
    Me,
    Categories,
    /// List your products
    Products {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        status: Option<ProductStatus>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one product
    Show { id: String },
    /// Status changes available for a product
    Actions { id: String },
    Create(ProductArgs),
    Update {
        id: String,
        #[command(flatten)]
        product: ProductArgs,
    },
    /// Change a product's status (available, sold, cancelled)
    Status { id: String, status: ProductStatus },
    /// Metrics of the last 30 days
    Dashboard,
}

#[derive(Args, Debug)]
struct ProductArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    description: String,
    /// Price in major units, e.g. 12,50
    #[arg(long)]
    price: String,
    /// Images to upload (repeatable). Required on create; on update, omit to keep the current ones
    #[arg(long = "image")]
    images: Vec<PathBuf>,
}

impl ProductArgs {
    fn into_form(self) -> Result<ProductForm> {
        Ok(ProductForm {
            title: self.title,
            category_id: self.category,
            description: self.description,
            price: self.price,
            attachments: read_uploads(&self.images)?,
        })
    }
}

fn read_uploads(paths: &[PathBuf]) -> Result<Vec<Upload>> {
    paths.iter().map(|path| read_upload(path)).collect()
}

fn read_upload(path: &Path) -> Result<Upload> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(Upload::from_path_name(file_name, bytes))
}

fn init_tracing(filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(filter))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = ConsoleConfig::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    init_tracing(&config.log_filter);
    tracing::debug!(api_url = %config.api_url, "config loaded");

    let command = match cli.command {
        // デモはセッションファイルに触れない
        Command::Demo => return demo::run().await,
        Command::Remote(command) => command,
    };

    let store = SessionStore::new(config.session_file.clone());
    let mut api = HttpMarketplaceApi::from_config(&config)?;
    let saved = store.load()?;
    if let Some(token) = saved.clone() {
        api = api.with_session(token);
    }
    let api = Arc::new(api);

    let mut console = SellerConsole::new(
        api.clone(),
        Arc::new(InMemoryResponseCache::new()),
        Arc::new(ConsoleNotifier),
    );
    if saved.is_some() {
        console = console.assume_signed_in();
    }

    let result = run(&console, command).await;

    match console.session_state() {
        SessionState::SignedIn => {
            if let Some(token) = api.session() {
                store.save(&token)?;
            }
        }
        SessionState::SignInRequired => {
            store.clear()?;
            eprintln!("Session expired. Run `sellerdesk sign-in` again.");
        }
        SessionState::Anonymous => store.clear()?,
    }

    result
}

async fn run(console: &SellerConsole, command: RemoteCommand) -> Result<()> {
    match command {
        RemoteCommand::Register {
            name,
            phone,
            email,
            password,
            password_confirmation,
            avatar,
        } => {
            let avatar = match avatar {
                Some(path) => vec![read_upload(&path)?],
                None => vec![],
            };
            let seller = console
                .register(&RegistrationForm {
                    name,
                    phone,
                    email,
                    password,
                    password_confirmation,
                    avatar,
                })
                .await?;
            print!("{}", render::seller(&seller));
        }
        RemoteCommand::SignIn { email, password } => {
            let seller = console.sign_in(&SignInForm { email, password }).await?;
            println!("signed in as {}", seller.name);
        }
        RemoteCommand::SignOut => {
            console.sign_out().await?;
            println!("signed out");
        }
        RemoteCommand::Me => print!("{}", render::seller(&console.profile().await?.seller)),
        RemoteCommand::Categories => {
            print!("{}", render::categories(&console.categories().await?.categories))
        }
        RemoteCommand::Products {
            page,
            status,
            search,
        } => {
            let mut filter = ProductFilter::default();
            if let Some(page) = page {
                filter = filter.with_page(page);
            }
            if let Some(status) = status {
                filter = filter.with_status(status);
            }
            if let Some(search) = search {
                filter = filter.with_search(search);
            }
            print!("{}", render::product_rows(&console.products(&filter).await?.products));
        }
        RemoteCommand::Show { id } => {
            let response = console.product(&ProductId::new(id)).await?;
            print!("{}", render::product(&response.product));
        }
        RemoteCommand::Actions { id } => {
            let response = console.product(&ProductId::new(id)).await?;
            print!("{}", render::actions(&status_actions(response.product.status)));
        }
        RemoteCommand::Create(args) => {
            let product = console.create_product(&args.into_form()?).await?;
            print!("{}", render::product(&product));
        }
        RemoteCommand::Update { id, product } => {
            let id = ProductId::new(id);
            // 事前に取得して、添付と状態をキャッシュに載せる
            console.product(&id).await?;
            let product = console.update_product(&id, &product.into_form()?).await?;
            print!("{}", render::product(&product));
        }
        RemoteCommand::Status { id, status } => {
            let id = ProductId::new(id);
            console.product(&id).await?;
            let product = console.change_status(&id, status).await?;
            print!("{}", render::product(&product));
        }
        RemoteCommand::Dashboard => print!("{}", render::dashboard(&console.dashboard().await?)),
    }
    Ok(())
}
