use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use photoframe::{
    BlobStore, CommandTranscoder, Compositor, FsBlobStore, LayoutConfigStore, LayoutRect,
    PhotoframeApi, PreparedSnapshot, ServiceConfig, SettingsAccessor, TemplateAssetStore,
    TemplateRole, Transcoder, convert_to_jpeg,
};
use tracing_subscriber::EnvFilter;

mod server;

#[derive(Parser, Debug)]
#[command(name = "photoframe", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Composite a photo with the stored templates and write a JPEG.
    Compose(ComposeArgs),
    /// Print the current public settings as JSON.
    Settings(StoreArgs),
    /// Save the user photo placement.
    Layout(LayoutArgs),
    /// Upload a background or overlay template.
    Upload(UploadArgs),
    /// Convert any supported photo (HEIC included, via the transcoder) to JPEG.
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct StoreArgs {
    /// JSON service config; flags override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Blob store directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Externally visible base URL; blob URLs are `<base>/blobs/<key>`.
    #[arg(long)]
    public_base_url: Option<String>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Socket address to listen on.
    #[arg(long)]
    listen: Option<String>,

    /// Admin user name for Basic auth.
    #[arg(long)]
    admin_id: Option<String>,

    /// Admin password for Basic auth.
    #[arg(long, env = "PHOTOFRAME_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Static bearer token for admin routes.
    #[arg(long, env = "PHOTOFRAME_ADMIN_TOKEN", hide_env_values = true)]
    admin_token: Option<String>,

    /// HTTP worker threads.
    #[arg(long)]
    workers: Option<usize>,

    /// Largest accepted request body, in bytes.
    #[arg(long)]
    max_body_bytes: Option<usize>,
}

#[derive(Args, Debug)]
struct ComposeArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// User photo.
    #[arg(long)]
    photo: PathBuf,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,

    /// Background template file, replacing the stored one.
    #[arg(long)]
    background: Option<PathBuf>,

    /// Overlay template file, replacing the stored one.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Photo placement `x,y,width,height`, replacing the stored one.
    #[arg(long, value_parser = parse_area)]
    area: Option<LayoutRect>,
}

#[derive(Args, Debug)]
struct LayoutArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Placement `x,y,width,height` in canvas pixels.
    #[arg(value_parser = parse_area)]
    area: LayoutRect,
}

#[derive(Args, Debug)]
struct UploadArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// `background` or `overlay`.
    #[arg(long = "type")]
    role: TemplateRole,

    /// Template image.
    file: PathBuf,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Optional config providing the transcoder.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Source photo.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output JPEG path.
    #[arg(long)]
    out: PathBuf,
}

fn parse_area(s: &str) -> Result<LayoutRect, String> {
    let fields = s
        .split(',')
        .map(|v| v.trim().parse::<u32>().map_err(|e| format!("'{v}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    let [x, y, width, height] = fields[..] else {
        return Err("expected x,y,width,height".to_string());
    };
    LayoutRect::new(x, y, width, height).map_err(|e| e.to_string())
}

impl StoreArgs {
    fn load(&self) -> anyhow::Result<ServiceConfig> {
        let mut cfg = match &self.config {
            Some(path) => ServiceConfig::from_path(path)?,
            None => ServiceConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            cfg.data_dir = dir.clone();
        }
        if let Some(url) = &self.public_base_url {
            cfg.public_base_url = url.clone();
        }
        Ok(cfg)
    }
}

fn open_store(cfg: &ServiceConfig) -> Arc<dyn BlobStore> {
    Arc::new(FsBlobStore::new(cfg.data_dir.clone(), cfg.blob_base_url()))
}

fn read_file(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read '{}'", path.display()))
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Serve(args) => cmd_serve(args),
        Command::Compose(args) => cmd_compose(args),
        Command::Settings(args) => cmd_settings(args),
        Command::Layout(args) => cmd_layout(args),
        Command::Upload(args) => cmd_upload(args),
        Command::Convert(args) => cmd_convert(args),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut cfg = args.store.load()?;
    if let Some(listen) = args.listen {
        cfg.listen = listen;
    }
    if let Some(id) = args.admin_id {
        cfg.admin_id = id;
    }
    if args.admin_password.is_some() {
        cfg.admin_password = args.admin_password;
    }
    if args.admin_token.is_some() {
        cfg.admin_token = args.admin_token;
    }
    if args.workers.is_some() {
        cfg.workers = args.workers;
    }
    if let Some(limit) = args.max_body_bytes {
        cfg.max_body_bytes = limit;
    }
    cfg.validate()?;

    let api = PhotoframeApi::from_config(&cfg, open_store(&cfg));
    let workers = cfg.worker_count();
    let server = server::bind(&cfg.listen)?;
    tracing::info!(
        listen = %cfg.listen,
        data_dir = %cfg.data_dir.display(),
        workers,
        "serving"
    );
    server::run(server, api, workers)
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let cfg = args.store.load()?;
    let mut snapshot: PreparedSnapshot = SettingsAccessor::new(open_store(&cfg)).read_prepared();
    if let Some(path) = &args.background {
        snapshot = snapshot.with_template(
            TemplateRole::Background,
            path.display().to_string(),
            read_file(path)?,
        );
    }
    if let Some(path) = &args.overlay {
        snapshot = snapshot.with_template(
            TemplateRole::Overlay,
            path.display().to_string(),
            read_file(path)?,
        );
    }
    if let Some(area) = args.area {
        snapshot.user_image_area = area;
    }

    let mut compositor = Compositor::default();
    if let Some(t) = &cfg.transcoder {
        compositor = compositor.with_transcoder(Arc::new(CommandTranscoder::from_config(t)));
    }
    let jpeg = compositor.compose(&read_file(&args.photo)?, &snapshot)?;
    write_file(&args.out, &jpeg)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_settings(args: StoreArgs) -> anyhow::Result<()> {
    let cfg = args.load()?;
    let public = SettingsAccessor::new(open_store(&cfg)).read().to_public();
    println!("{}", serde_json::to_string_pretty(&public)?);
    Ok(())
}

fn cmd_layout(args: LayoutArgs) -> anyhow::Result<()> {
    let cfg = args.store.load()?;
    let entry = LayoutConfigStore::new(open_store(&cfg)).save(args.area)?;
    println!("{}", entry.url);
    Ok(())
}

fn cmd_upload(args: UploadArgs) -> anyhow::Result<()> {
    let cfg = args.store.load()?;
    let url = TemplateAssetStore::new(open_store(&cfg)).upload(args.role, &read_file(&args.file)?)?;
    println!("{url}");
    Ok(())
}

fn cmd_convert(args: ConvertArgs) -> anyhow::Result<()> {
    let cfg = match &args.config {
        Some(path) => ServiceConfig::from_path(path)?,
        None => ServiceConfig::default(),
    };
    let transcoder: Option<Box<dyn Transcoder>> = cfg
        .transcoder
        .as_ref()
        .map(|t| Box::new(CommandTranscoder::from_config(t)) as Box<dyn Transcoder>);
    let file_name = args.in_path.file_name().and_then(|n| n.to_str());
    let jpeg = convert_to_jpeg(&read_file(&args.in_path)?, file_name, transcoder.as_deref())?;
    write_file(&args.out, &jpeg)?;

    // Verify the output decodes before reporting success.
    let img = image::load_from_memory(&jpeg).context("decode converted jpeg")?;
    eprintln!("wrote {} ({}x{})", args.out.display(), img.width(), img.height());
    Ok(())
}
