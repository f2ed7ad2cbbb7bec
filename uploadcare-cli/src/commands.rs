use anyhow::Context;
use clap::{Parser, Subcommand};
use uploadcare::{sign, Credentials, Expire, Store, UploadApi, UploadRequest};

/// Upload files to Uploadcare and inspect them
#[derive(Debug, Parser)]
#[command(name = "uploadcare", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload a local file or a remote URL and print its CDN URL
    Upload {
        /// Local file path or http(s) URL
        source: String,
        /// Signature expiration, e.g. "in 30 minutes", "2030-01-01" or a Unix timestamp
        #[arg(long)]
        expire: Option<String>,
        /// Precomputed signature to send instead of signing with the secret key
        #[arg(long, requires = "expire")]
        signature: Option<String>,
        /// Storage behaviour: auto, 1 or 0
        #[arg(long, default_value = "auto")]
        store: Store,
        /// Metadata entry as KEY=VALUE, may be repeated
        #[arg(long = "meta", value_parser = parse_key_value)]
        metadata: Vec<(String, String)>,
    },
    /// Print metadata of an uploaded file
    Info {
        /// CDN URL or UUID of the file
        file: String,
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the expire/signature pair for a secure upload
    Sign {
        /// Signature expiration
        expire: String,
    },
    /// Manage file groups
    Group {
        #[command(subcommand)]
        command: GroupCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    /// Group previously uploaded files
    Create {
        /// File UUIDs or CDN URLs
        #[arg(required = true)]
        files: Vec<String>,
        /// Signature expiration
        #[arg(long)]
        expire: Option<String>,
    },
    /// Print metadata of a file group
    Info {
        /// Group id, e.g. "<uuid>~2"
        group_id: String,
    },
}

fn parse_key_value(input: &str) -> Result<(String, String), String> {
    input
        .split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {input:?}"))
}

/// Runs a command against the Upload API, returning what should be printed
pub async fn execute(
    api: &dyn UploadApi,
    credentials: &Credentials,
    command: Command,
) -> anyhow::Result<String> {
    match command {
        Command::Upload {
            source,
            expire,
            signature,
            store,
            metadata,
        } => {
            let mut request = UploadRequest::new(source).store(store);
            if let Some(expire) = expire {
                request = request.expire(expire);
            }
            if let Some(signature) = signature {
                request = request.signature(signature);
            }
            for (key, value) in metadata {
                request = request.metadata(key, value);
            }

            let source = request.source().to_string();
            let uploaded = api
                .upload(request)
                .await
                .with_context(|| format!("Failed to upload {source}"))?;
            Ok(uploaded.url)
        }
        Command::Info { file, pretty } => {
            if pretty {
                return api
                    .info_pretty(&file)
                    .await
                    .with_context(|| format!("Failed to fetch info for {file}"));
            }
            let info = api
                .info(&file)
                .await
                .with_context(|| format!("Failed to fetch info for {file}"))?;
            Ok(serde_json::to_string(&info)?)
        }
        Command::Sign { expire } => {
            let secret_key = credentials
                .secret_key()
                .context("UPLOADCARE_SECRET_KEY must be set to sign uploads")?;
            let signed = sign(secret_key, expire)?;
            Ok(format!(
                "expire={}\nsignature={}",
                signed.expire, signed.signature
            ))
        }
        Command::Group { command } => match command {
            GroupCommand::Create { files, expire } => {
                let group = api
                    .create_group(files, expire.map(Expire::from))
                    .await
                    .context("Failed to create group")?;
                Ok(group.to_pretty_string()?)
            }
            GroupCommand::Info { group_id } => {
                let group = api
                    .group_info(&group_id)
                    .await
                    .with_context(|| format!("Failed to fetch group {group_id}"))?;
                Ok(group.to_pretty_string()?)
            }
        },
    }
}
