pub use crate::app::{Cli, Command, FeedArg, PexCliApp};

mod app {
    use anyhow::{bail, Result};
    use clap::{Parser, Subcommand, ValueEnum};
    use log::info;
    use pexwall_core::{Config, FeedKind, RequestContext, Wallpaper, WallpaperPage, WallpaperService};
    use std::time::Duration;

    #[derive(Debug, Parser)]
    #[command(name = "pexcli")]
    #[command(about = "Browse Pexels wallpaper feeds from the terminal")]
    #[command(version)]
    pub struct Cli {
        /// Print results as JSON instead of text
        #[arg(long, global = true)]
        pub json: bool,

        /// Upstream request timeout in seconds
        #[arg(long, global = true, value_name = "SECS")]
        pub timeout: Option<u64>,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
    pub enum FeedArg {
        Popular,
        New,
        Trending,
        Random,
    }

    impl From<FeedArg> for FeedKind {
        fn from(arg: FeedArg) -> Self {
            match arg {
                FeedArg::Popular => FeedKind::Popular,
                FeedArg::New => FeedKind::New,
                FeedArg::Trending => FeedKind::Trending,
                FeedArg::Random => FeedKind::Random,
            }
        }
    }

    #[derive(Debug, Subcommand)]
    pub enum Command {
        /// One of the built-in feeds
        Feed {
            #[arg(value_enum)]
            kind: FeedArg,
            #[arg(long, default_value_t = 1)]
            page: u32,
        },
        /// Photos of a catalog category
        Category {
            id: String,
            #[arg(long, default_value_t = 1)]
            page: u32,
        },
        /// Free-text photo search
        Search {
            query: String,
            #[arg(long, default_value_t = 1)]
            page: u32,
        },
        /// A single photo by wallpaper id, e.g. pexels-2014422
        Photo { id: String },
        /// All categories with their cover images
        Categories,
        /// One category with its cover image
        ShowCategory { id: String },
        /// Bypass the cache and reload page 1 of a feed
        /// (popular, new, trending, random, category-<id>, search-<query>)
        Refresh {
            #[arg(value_parser = parse_feed_kind)]
            kind: FeedKind,
        },
    }

    fn parse_feed_kind(s: &str) -> std::result::Result<FeedKind, String> {
        s.parse::<FeedKind>().map_err(|e| e.to_string())
    }

    pub struct PexCliApp {
        service: WallpaperService,
        json: bool,
    }

    impl PexCliApp {
        pub fn new(cli: &Cli) -> Result<Self> {
            let mut config = Config::load()?;
            if let Some(secs) = cli.timeout {
                if secs == 0 {
                    bail!("--timeout must be at least one second");
                }
                config.request_timeout = Duration::from_secs(secs);
            }
            info!("pexcli: using {} (timeout {:?})", config.base_url, config.request_timeout);

            Ok(Self {
                service: WallpaperService::new(&config)?,
                json: cli.json,
            })
        }

        pub fn service(&self) -> &WallpaperService {
            &self.service
        }

        pub async fn run(&self, command: &Command, ctx: &RequestContext) -> Result<()> {
            match command {
                Command::Feed { kind, page } => {
                    let page = self.service.feed(&FeedKind::from(*kind), *page, ctx).await;
                    self.print_page(&page)
                }
                Command::Category { id, page } => {
                    if self.service.registry().definition(id).is_none() {
                        bail!("unknown category '{}', see `pexcli categories`", id);
                    }
                    let kind = FeedKind::Category(id.clone());
                    let page = self.service.feed(&kind, *page, ctx).await;
                    self.print_page(&page)
                }
                Command::Search { query, page } => {
                    let kind = FeedKind::Search(query.clone());
                    let page = self.service.feed(&kind, *page, ctx).await;
                    self.print_page(&page)
                }
                Command::Photo { id } => match self.service.photo_by_id(id, ctx).await {
                    Some(wallpaper) => self.print_wallpaper(&wallpaper),
                    None => {
                        println!("No photo found for {}", id);
                        Ok(())
                    }
                },
                Command::Categories => {
                    let categories = self.service.categories().await;
                    if self.json {
                        println!("{}", serde_json::to_string_pretty(&categories)?);
                    } else {
                        for category in &categories {
                            println!("{:<14} {:<14} {}", category.id, category.name, category.image_url);
                        }
                    }
                    Ok(())
                }
                Command::ShowCategory { id } => match self.service.category(id).await {
                    Some(category) => {
                        if self.json {
                            println!("{}", serde_json::to_string_pretty(&category)?);
                        } else {
                            println!("{} ({})", category.name, category.id);
                            if let Some(description) = &category.description {
                                println!("  {}", description);
                            }
                            println!("  search: {}", category.query);
                            println!("  cover:  {}", category.image_url);
                        }
                        Ok(())
                    }
                    None => bail!("unknown category '{}'", id),
                },
                Command::Refresh { kind } => {
                    let page = self.service.refresh(kind, ctx).await;
                    self.print_page(&page)
                }
            }
        }

        fn print_page(&self, page: &WallpaperPage) -> Result<()> {
            if self.json {
                println!("{}", serde_json::to_string_pretty(page)?);
                return Ok(());
            }

            if page.is_empty() {
                println!("No photos.");
                return Ok(());
            }
            for wallpaper in &page.wallpapers {
                println!("{}  {}", wallpaper.id, shorten(&wallpaper.title, 48));
                println!("    by {}  {}", wallpaper.photographer, wallpaper.image_url);
            }
            match page.next_page {
                Some(next) => println!("\n{} results, next page: {}", page.total_results, next),
                None => println!("\n{} results, last page", page.total_results),
            }
            Ok(())
        }

        fn print_wallpaper(&self, wallpaper: &Wallpaper) -> Result<()> {
            if self.json {
                println!("{}", serde_json::to_string_pretty(wallpaper)?);
            } else {
                println!("{}", wallpaper.title);
                println!("  id:           {}", wallpaper.id);
                println!("  photographer: {} ({})", wallpaper.photographer, wallpaper.photographer_url);
                println!("  image:        {}", wallpaper.image_url);
                println!("  original:     {}", wallpaper.original_url);
            }
            Ok(())
        }
    }

    fn shorten(title: &str, max_chars: usize) -> String {
        if title.chars().count() > max_chars {
            let cut: String = title.chars().take(max_chars).collect();
            format!("{}...", cut)
        } else {
            title.to_string()
        }
    }

}
