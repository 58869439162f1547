use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser};
use postings_core::domain::category::{
    Budget, Headcount, Location, Period, Season, Theme, Vehicle, WithWho,
};
use postings_core::domain::listing::{Page, PostingFilter, PostingQuery, Sorting};
use postings_core::domain::posting::{NewPosting, PostingSummary, UpdatePosting};
use postings_core::infrastructure::config::AppConfig;
use postings_core::infrastructure::database::{create_pool, run_migrations};
use postings_core::infrastructure::logging::init_logging;
use postings_core::{
    FileStorage, LocalFileStorage, PostgresPostingRepository, PostgresUserRepository,
    PostingService, UploadedFile, UserService,
};
use tracing::info;
use uuid::Uuid;

#[derive(Parser, Debug)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct CategoryArgs {
    #[clap(long)]
    budget: Budget,
    #[clap(long)]
    headcount: Headcount,
    #[clap(long)]
    location: Location,
    #[clap(long)]
    period: Period,
    #[clap(long)]
    season: Season,
    #[clap(long)]
    vehicle: Vehicle,
    #[clap(long, value_delimiter = ',')]
    theme: Vec<Theme>,
    #[clap(long, value_delimiter = ',')]
    with_who: Vec<WithWho>,
}

#[derive(Args, Debug)]
struct FilterArgs {
    #[clap(long)]
    budget: Option<Budget>,
    #[clap(long)]
    headcount: Option<Headcount>,
    #[clap(long)]
    location: Option<Location>,
    #[clap(long)]
    period: Option<Period>,
    #[clap(long)]
    season: Option<Season>,
    #[clap(long)]
    vehicle: Option<Vehicle>,
    #[clap(long, value_delimiter = ',')]
    theme: Vec<Theme>,
    #[clap(long, value_delimiter = ',')]
    with_who: Vec<WithWho>,
}

impl From<FilterArgs> for PostingFilter {
    fn from(args: FilterArgs) -> Self {
        PostingFilter {
            budget: args.budget,
            headcount: args.headcount,
            location: args.location,
            period: args.period,
            season: args.season,
            vehicle: args.vehicle,
            theme: args.theme,
            with_who: args.with_who,
        }
    }
}

#[derive(Parser, Debug)]
enum Command {
    Migrate,
    AddWriter {
        #[clap(long)]
        email: String,
        #[clap(long)]
        nickname: String,
        #[clap(long)]
        profile_image: Option<String>,
    },
    Create {
        #[clap(long)]
        writer: Uuid,
        #[clap(long)]
        title: String,
        #[clap(long, default_value = "")]
        content: String,
        #[clap(flatten)]
        categories: CategoryArgs,
        #[clap(long)]
        thumbnail: Option<PathBuf>,
    },
    Show {
        id: Uuid,
    },
    ShowWriter {
        id: Uuid,
    },
    List {
        #[clap(long, default_value = "")]
        keyword: String,
        #[clap(long, default_value = "newest")]
        sorting: String,
        #[clap(long, default_value_t = 1, allow_negative_numbers = true)]
        offset: i64,
        #[clap(long, default_value_t = 10)]
        limit: i64,
        #[clap(flatten)]
        filter: FilterArgs,
    },
    Titles {
        keyword: String,
    },
    ByWriter {
        writer: Uuid,
    },
    Update {
        id: Uuid,
        #[clap(long)]
        writer: Uuid,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        content: Option<String>,
        #[clap(flatten)]
        filter: FilterArgs,
    },
    Thumbnail {
        id: Uuid,
        #[clap(long)]
        writer: Uuid,
        file: PathBuf,
    },
    Delete {
        id: Uuid,
        #[clap(long)]
        writer: Uuid,
    },
    Like {
        id: Uuid,
        #[clap(long)]
        user: Uuid,
    },
    Unlike {
        id: Uuid,
        #[clap(long)]
        user: Uuid,
    },
    Report {
        id: Uuid,
        #[clap(long)]
        reporter: Uuid,
        #[clap(long)]
        reason: String,
    },
    Upload {
        #[clap(long)]
        namespace: String,
        file: PathBuf,
    },
    DeleteFile {
        path: String,
    },
}

async fn read_upload(path: &PathBuf) -> anyhow::Result<UploadedFile> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(UploadedFile::new(name, bytes))
}

fn print_summary(summary: &PostingSummary) {
    let posting = &summary.posting;
    println!(
        "- [{}] {} (by {}, {} likes, {})",
        posting.id,
        posting.title,
        summary.writer.nickname,
        summary.liked_count,
        posting.created_at.format("%Y-%m-%d %H:%M")
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let args = Cli::parse();

    if let Command::Upload { namespace, file } = &args.command {
        let storage = LocalFileStorage::new(AppConfig::storage_dir_from_env());
        let stored = storage.upload(namespace, read_upload(file).await?).await?;
        println!("Uploaded: {}", stored.path);
        return Ok(());
    }
    if let Command::DeleteFile { path } = &args.command {
        let storage = LocalFileStorage::new(AppConfig::storage_dir_from_env());
        storage.delete(path).await?;
        println!("File deleted!");
        return Ok(());
    }

    let config = AppConfig::from_env()?;
    let storage = Arc::new(LocalFileStorage::new(&config.storage_dir));
    let pool = create_pool(&config)
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    let users = UserService::new(Arc::new(PostgresUserRepository::new(pool.clone())));
    let postings = PostingService::new(
        Arc::new(PostgresPostingRepository::new(pool.clone())),
        Arc::clone(&storage),
    );

    match args.command {
        Command::Migrate => {
            info!("database is up to date");
            println!("Migrations applied!");
        }
        Command::AddWriter {
            email,
            nickname,
            profile_image,
        } => {
            let user = users.register_writer(email, nickname, profile_image).await?;
            println!("Writer created! ID: {}", user.id);
        }
        Command::Create {
            writer,
            title,
            content,
            categories,
            thumbnail,
        } => {
            let thumbnail = match thumbnail {
                Some(path) => Some(read_upload(&path).await?),
                None => None,
            };
            let new = NewPosting {
                title,
                content,
                budget: categories.budget,
                headcount: categories.headcount,
                location: categories.location,
                period: categories.period,
                season: categories.season,
                vehicle: categories.vehicle,
                theme: categories.theme,
                with_who: categories.with_who,
            };
            let posting = postings.create_posting(writer, new, thumbnail).await?;
            println!("Posting created! ID: {}", posting.id);
        }
        Command::Show { id } => {
            let detail = match postings.get_posting(id).await {
                Ok(detail) => detail,
                Err(err) if err.is_not_found() => {
                    println!("Not found: {err}");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };
            println!("{}", serde_json::to_string_pretty(&detail)?);
            println!("liked: {}", detail.liked_count());
        }
        Command::ShowWriter { id } => {
            let user = match users.get_writer(id).await {
                Ok(user) => user,
                Err(err) if err.is_not_found() => {
                    println!("Not found: {err}");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };
            println!("{}", serde_json::to_string_pretty(&user.as_writer())?);
        }
        Command::List {
            keyword,
            sorting,
            offset,
            limit,
            filter,
        } => {
            let query = PostingQuery {
                keyword,
                sorting: Sorting::parse_lenient(&sorting),
                page: Page::new(offset, limit),
                filter: filter.into(),
            };
            let found = postings.list_postings(&query).await?;
            println!(
                "Postings ({}, page {}, {})",
                found.len(),
                query.page.offset(),
                query.sorting.as_str()
            );
            found.iter().for_each(print_summary);
        }
        Command::Titles { keyword } => {
            for title in postings.search_titles(&keyword).await? {
                println!("{}", title.title);
            }
        }
        Command::ByWriter { writer } => {
            let found = postings.list_by_writer(writer).await?;
            println!("Postings ({})", found.len());
            found.iter().for_each(print_summary);
        }
        Command::Update {
            id,
            writer,
            title,
            content,
            filter,
        } => {
            let update = UpdatePosting {
                title,
                content,
                budget: filter.budget,
                headcount: filter.headcount,
                location: filter.location,
                period: filter.period,
                season: filter.season,
                vehicle: filter.vehicle,
                theme: (!filter.theme.is_empty()).then_some(filter.theme),
                with_who: (!filter.with_who.is_empty()).then_some(filter.with_who),
            };
            let posting = postings.update_posting(writer, id, update).await?;
            println!("Posting updated: {}", posting.title);
        }
        Command::Thumbnail { id, writer, file } => {
            let stored = postings
                .replace_thumbnail(writer, id, read_upload(&file).await?)
                .await?;
            println!("Thumbnail stored: {}", stored.image_url);
        }
        Command::Delete { id, writer } => {
            postings.delete_posting(writer, id).await?;
            println!("Posting deleted!");
        }
        Command::Like { id, user } => {
            postings.like(user, id).await?;
            println!("Liked!");
        }
        Command::Unlike { id, user } => {
            postings.unlike(user, id).await?;
            println!("Like removed!");
        }
        Command::Report {
            id,
            reporter,
            reason,
        } => {
            let report = postings.report(reporter, id, reason).await?;
            println!("Report filed! ID: {}", report.id);
        }
        Command::Upload { .. } | Command::DeleteFile { .. } => {}
    }

    Ok(())
}
