use reel_rating::infra::config::{self, Config, StoreBackend};
use reel_rating::storage::docs::{DocumentStore, PostgresDocumentStore};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--ensure-schema]\n\
         \n\
         Reads the same env vars as api_server:\n\
           STORE_BACKEND, DATABASE_URL, DATABASE_MAX_CONNECTIONS,\n\
           DATABASE_ACQUIRE_TIMEOUT_SECS, BIND_ADDR\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let ensure_schema = args.iter().any(|a| a == "--ensure-schema");

    // Force-read config (nice error messages if missing)
    let cfg = Config::from_env()?;

    println!("> Preflight:");
    println!("  STORE_BACKEND={:?}", cfg.backend);
    println!("  BIND_ADDR={}", cfg.bind_addr);

    if cfg.backend == StoreBackend::Memory {
        println!("  In-memory store selected; nothing to check.");
        println!("> Preflight OK.");
        return Ok(());
    }

    let database = match cfg.database {
        Some(database) => database,
        None => config::database_config()?,
    };
    println!("  DATABASE_MAX_CONNECTIONS={}", database.max_connections);
    println!("  DATABASE_ACQUIRE_TIMEOUT_SECS={}", database.acquire_timeout_secs);

    let store = PostgresDocumentStore::connect(&database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to DATABASE_URL: {}", e))?;
    store.ping().await?;
    println!("  Database reachable.");

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = 'documents')",
    )
    .fetch_one(store.pool())
    .await?;

    if table_exists {
        println!("  documents table exists.");
    } else if ensure_schema {
        println!("  documents table missing -> creating...");
        store.ensure_schema().await?;
        println!("  documents table created.");
    } else {
        return Err(anyhow::anyhow!(
            "documents table does not exist. Re-run with --ensure-schema (or start api_server once)"
        ));
    }

    println!("> Preflight OK.");
    Ok(())
}
