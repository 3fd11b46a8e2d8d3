//! Comuna - share photos with your community from the terminal
#![allow(clippy::uninlined_format_args)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use comuna::api::{Gateway, SupabaseClient};
use comuna::models::{CommentId, PostId, ProfileId};
use comuna::{
    CancelToken, CommentThreads, Config, DraftPost, FeedStore, MediaPublishPipeline,
    NavigationRequest, NotificationRouter, demo, paths, router,
};

/// Width used when wrapping descriptions and comments
const WRAP_WIDTH: usize = 72;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (RUST_LOG=debug for verbose output)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let (command, demo_mode) = parse_args()?;

    match command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            print_version();
            return Ok(());
        }
        Command::Config => return show_config(),
        _ => {}
    }

    let session = Session::open(demo_mode)?;

    match command {
        Command::Feed { limit } => feed_cli(&session, limit).await,
        Command::Post { image, description } => post_cli(&session, image, &description).await,
        Command::Comments { post_id } => comments_cli(&session, &post_id).await,
        Command::Comment { post_id, text } => comment_cli(&session, &post_id, &text).await,
        Command::Likes { comment_id } => likes_cli(&session, &comment_id).await,
        Command::Open { post_id } => open_cli(&session, post_id).await,
        Command::Help | Command::Version | Command::Config => Ok(()),
    }
}

/// CLI commands
enum Command {
    Feed { limit: Option<usize> },
    Post { image: PathBuf, description: String },
    Comments { post_id: PostId },
    Comment { post_id: PostId, text: String },
    Likes { comment_id: CommentId },
    Open { post_id: String },
    Config,
    Help,
    Version,
}

fn parse_args() -> Result<(Command, bool)> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let demo_mode = args.iter().any(|a| a == "--demo");
    args.retain(|a| a != "--demo");

    let Some(first) = args.first() else {
        return Ok((Command::Feed { limit: None }, demo_mode));
    };

    let command = match first.as_str() {
        "-h" | "--help" | "help" => Command::Help,
        "-v" | "--version" | "version" => Command::Version,
        "config" => Command::Config,

        "feed" => {
            let limit = args
                .iter()
                .position(|a| a == "--limit" || a == "-l")
                .map(|i| {
                    args.get(i + 1)
                        .context("Missing value for --limit")?
                        .parse::<usize>()
                        .context("--limit must be a number")
                })
                .transpose()?;
            Command::Feed { limit }
        }

        "post" => {
            let image = args
                .get(1)
                .map(PathBuf::from)
                .context("Missing image path\nExample: comuna post photo.jpg \"Sunset\"")?;
            let description = args.get(2).cloned().unwrap_or_default();
            Command::Post { image, description }
        }

        "comments" => Command::Comments {
            post_id: PostId::new(args.get(1).context("Missing post id")?.as_str()),
        },

        "comment" => {
            let post_id = PostId::new(args.get(1).context("Missing post id")?.as_str());
            let text = args.get(2).context("Missing comment text")?.clone();
            Command::Comment { post_id, text }
        }

        "likes" => Command::Likes {
            comment_id: CommentId::new(args.get(1).context("Missing comment id")?.as_str()),
        },

        "open" => Command::Open {
            post_id: args.get(1).context("Missing post id")?.clone(),
        },

        other => {
            return Err(anyhow::anyhow!(
                "Unknown command: {other}\nRun 'comuna --help' for usage"
            ));
        }
    };

    Ok((command, demo_mode))
}

fn print_help() {
    let config_path = Config::default_path()
        .map_or_else(|_| "Unknown".to_string(), |p| p.display().to_string());

    println!(
        r#"{}
Comuna - share photos with your community

USAGE:
    comuna                             Show the feed
    comuna [COMMAND] [--demo]

COMMANDS:
    feed [OPTIONS]                     Show the feed, newest first
      Options:
        -l, --limit <n>                Number of posts (default: page_size)

    post <image> [description]         Publish a photo (Ctrl-C cancels)
      Examples:
        comuna post sunset.jpg "Evening at the pier"

    comments <post-id>                 Show a post's comments
    comment <post-id> <text>           Comment on a post
    likes <comment-id>                 Show who liked a comment
    open <post-id>                     Open a post as a notification would
    config                             Show the configuration

OPTIONS:
    --demo                             Use sample data instead of the backend
    -h, --help                         Show this help message
    -v, --version                      Show version information

CONFIG:
    {}
"#,
        comuna::LOGO,
        config_path
    );
}

fn print_version() {
    println!("comuna {}", comuna::VERSION);
}

fn show_config() -> Result<()> {
    let path = Config::default_path()?;
    if !path.exists() {
        Config::default().save()?;
        println!("Created default config at {}\n", path.display());
    }

    let content = std::fs::read_to_string(&path).context("Failed to read config file")?;
    println!("# {}\n{}", path.display(), content);
    Ok(())
}

/// Backend, settings and acting profile for one invocation
struct Session {
    config: Config,
    gateway: Arc<Gateway>,
    author: Option<ProfileId>,
}

impl Session {
    fn open(demo_mode: bool) -> Result<Self> {
        let config = Config::load()?;

        if demo_mode {
            return Ok(Self {
                config,
                gateway: Arc::new(Gateway::Memory(demo::demo_gateway())),
                author: Some(ProfileId::new(demo::DEMO_AUTHOR)),
            });
        }

        if !config.has_backend() {
            anyhow::bail!(
                "No backend configured.\nSet [backend] url and api_key in {}\nor try: comuna --demo",
                Config::default_path()?.display()
            );
        }

        let client = SupabaseClient::new(&config.backend)?;
        let author = config.author().ok();
        Ok(Self {
            config,
            gateway: Arc::new(Gateway::Supabase(client)),
            author,
        })
    }

    fn author(&self) -> Result<&ProfileId> {
        self.author
            .as_ref()
            .context("No author_id configured; set it in the config file")
    }
}

fn wrapped(text: &str, indent: &str) -> String {
    let options = textwrap::Options::new(WRAP_WIDTH)
        .initial_indent(indent)
        .subsequent_indent(indent);
    textwrap::fill(text, options)
}

async fn feed_cli(session: &Session, limit: Option<usize>) -> Result<()> {
    let mut feed_config = session.config.feed.clone();
    if let Some(limit) = limit {
        feed_config.page_size = limit;
    }

    let mut feed = FeedStore::new(Arc::clone(&session.gateway), feed_config);
    let posts = feed.refresh().await?;

    if posts.is_empty() {
        println!("Nothing here yet. Be the first to post!");
        return Ok(());
    }

    for post in posts {
        println!(
            "\n{} · {}  [{}]",
            post.author.display_name(),
            post.relative_time(),
            post.id
        );
        println!("  {}", post.image_url);
        if !post.description.is_empty() {
            println!("{}", wrapped(&post.description, "  "));
        }
        println!("  💬 {}", post.comment_count);
    }

    Ok(())
}

async fn post_cli(session: &Session, image: PathBuf, description: &str) -> Result<()> {
    let author = session.author()?.clone();

    let mut media_config = session.config.media.clone();
    if media_config.scratch_dir.is_none() {
        media_config.scratch_dir = Some(paths::media_scratch_dir()?);
    }
    let pipeline = MediaPublishPipeline::from_config(Arc::clone(&session.gateway), &media_config);

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("Failed to install Ctrl-C handler")?;

    let mut draft = DraftPost::new(image, description);
    println!("📷 Publishing {}...", draft.source().display());

    match pipeline.publish(&mut draft, &author, &cancel).await {
        Ok(post_id) => {
            println!("✓ Posted: {post_id}");
            if let Some(url) = draft.image_url() {
                println!("  {url}");
            }
            Ok(())
        }
        Err(e) => {
            let step = draft.failed_step().unwrap_or(draft.state());
            Err(e).context(format!("Publishing stopped at \"{}\"", step.label()))
        }
    }
}

async fn comments_cli(session: &Session, post_id: &PostId) -> Result<()> {
    let mut threads = CommentThreads::new(Arc::clone(&session.gateway));
    let thread = threads.load(post_id).await?;

    if thread.is_empty() {
        println!("No comments yet.");
        return Ok(());
    }

    for comment in thread.comments() {
        println!(
            "\n{} · {}  [{}]",
            comment.author.display_name(),
            comment.relative_time(),
            comment.id
        );
        println!("{}", wrapped(&comment.content, "  "));
    }

    Ok(())
}

async fn comment_cli(session: &Session, post_id: &PostId, text: &str) -> Result<()> {
    let author = session.author()?;
    let mut threads = CommentThreads::new(Arc::clone(&session.gateway));

    let comment_id = threads.submit(post_id, text, author).await?;
    println!("✓ Commented ({comment_id})");
    println!("  {} comments on this post", threads.comments(post_id).len());
    Ok(())
}

async fn likes_cli(session: &Session, comment_id: &CommentId) -> Result<()> {
    let threads = CommentThreads::new(Arc::clone(&session.gateway));
    let likers = threads.likers(comment_id).await?;

    if likers.is_empty() {
        println!("No likes yet.");
        return Ok(());
    }

    println!("♥ {} likes\n", likers.len());
    for profile in likers {
        println!("  {}", profile.display_name());
    }
    Ok(())
}

async fn open_cli(session: &Session, post_id: String) -> Result<()> {
    let (notifications, mut requests) = NotificationRouter::new();
    notifications.handle_notification(&serde_json::json!({ "post_id": post_id }));
    drop(notifications);

    let feed = FeedStore::new(Arc::clone(&session.gateway), session.config.feed.clone());
    let mut threads = CommentThreads::new(Arc::clone(&session.gateway));

    while let Some(request) = requests.recv().await {
        let NavigationRequest::Post(id) = request;
        let Some(detail) = router::open_detail(&feed, &mut threads, &id).await? else {
            println!("This post is no longer available.");
            continue;
        };

        let post = &detail.post;
        println!("{} · {}", post.author.display_name(), post.relative_time());
        println!("  {}", post.image_url);
        if !post.description.is_empty() {
            println!("{}", wrapped(&post.description, "  "));
        }

        println!("\n💬 {} comments", detail.comments.len());
        for comment in &detail.comments {
            println!("\n  {} · {}", comment.author.display_name(), comment.relative_time());
            println!("{}", wrapped(&comment.content, "    "));
        }
    }

    Ok(())
}
