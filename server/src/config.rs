use clap::Parser;

/// Command-line and environment configuration for the palengke server.
#[derive(Debug, Parser)]
#[command(name = "palengke-server", about = "Local farm marketplace backend")]
pub struct Cli {
    /// Address to bind the HTTP listener to.
    #[arg(long, default_value = "0.0.0.0", env = "PALENGKE_HOST")]
    pub host: String,

    /// Port for the HTTP listener.
    #[arg(long, default_value_t = 8080, env = "PALENGKE_PORT")]
    pub port: u16,

    /// Path to the SQLite database file. Created if missing.
    #[arg(long, default_value = "palengke.db", env = "DATABASE_URL")]
    pub database: String,

    /// Secret used to sign and verify JWTs.
    #[arg(long, env = "JWT_SECRET", default_value = "palengke-dev-secret", hide_env_values = true)]
    pub jwt_secret: String,

    /// Bcrypt work factor for password hashing. Lower it for local testing.
    #[arg(long, default_value_t = bcrypt::DEFAULT_COST, env = "BCRYPT_COST")]
    pub bcrypt_cost: u32,
}
