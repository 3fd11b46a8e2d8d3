//! # Comuna
//!
//! Client core for a small community photo-sharing app.
//!
//! ## Overview
//!
//! Members publish photos with a short description, browse a shared feed and
//! discuss each photo in a comment thread. This crate holds everything below
//! the screens: the feed, comment threads, the photo publishing pipeline and
//! the backend contract. Rendering and navigation belong to the host app.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Host app / CLI                           │
//! │  Screens, navigation, gestures (not part of this crate)     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │      Feed       │ │    Comments     │ │     Media       │
//! │                 │ │                 │ │                 │
//! │ • Refresh       │ │ • Load/submit   │ │ • Transform     │
//! │ • Visible post  │ │ • Likers        │ │ • Upload        │
//! │ • Resolve       │ │ • Evict         │ │ • Create post   │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//!          │                   │                   │
//!          └───────────────────┴───────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │       API       │ │     Router      │ │     Models      │
//! │                 │ │                 │ │                 │
//! │ • Supabase      │ │ • Notification  │ │ • Post          │
//! │ • In-memory     │ │ • open_post     │ │ • Comment       │
//! │ • Row parsing   │ │                 │ │ • DraftPost     │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Backend contract, Supabase client and in-memory backend
//! - [`comments`] - Per-post comment threads
//! - [`config`] - Configuration management
//! - [`demo`] - Sample community for `--demo`
//! - [`error`] - Error taxonomy of the core flows
//! - [`feed`] - The home feed
//! - [`media`] - Image preparation and the publish pipeline
//! - [`models`] - Data models (Post, Comment, ProfileRef, DraftPost)
//! - [`router`] - Notification entry point
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use comuna::{FeedStore, config::FeedConfig, demo};
//!
//! # async fn run() -> comuna::Result<()> {
//! let gateway = Arc::new(demo::demo_gateway());
//! let mut feed = FeedStore::new(gateway, FeedConfig::default());
//! for post in feed.refresh().await? {
//!     println!("{} · {}", post.author.display_name(), post.relative_time());
//! }
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/comuna/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::unused_async)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::if_not_else)]
#![allow(clippy::single_match_else)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::use_self)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::similar_names)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]

pub mod api;
pub mod comments;
pub mod config;
pub mod demo;
pub mod error;
pub mod feed;
pub mod media;
pub mod models;
pub mod paths;
pub mod router;

// Re-export main types for convenience
pub use api::{Gateway, RemoteGateway};
pub use comments::{CommentThread, CommentThreads};
pub use config::Config;
pub use error::{Error, Result};
pub use feed::FeedStore;
pub use media::{CancelToken, MediaPublishPipeline, MediaTransformer};
pub use models::{Comment, DraftPost, Post, ProfileRef, UploadState};
pub use router::{NavigationRequest, NotificationRouter};

/// ASCII logo for the application
pub const LOGO: &str = r"
   ______
  / ____/___  ____ ___  __  ______  ____ _
 / /   / __ \/ __ `__ \/ / / / __ \/ __ `/
/ /___/ /_/ / / / / / / /_/ / / / / /_/ /
\____/\____/_/ /_/ /_/\__,_/_/ /_/\__,_/
";

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
