use std::path::PathBuf;

use structopt::StructOpt;

use gridmail::{sendgrid, Error, Message};

#[derive(Debug, StructOpt)]
#[structopt(name = "gridmail", about = "One-shot SendGrid mail sender.")]
struct Opt {
    /// Config file path (default /etc/gridmail/gridmail.toml)
    #[structopt(short, long)]
    config: Option<String>,

    #[structopt(short, long)]
    from: String,

    #[structopt(long)]
    fromname: Option<String>,

    /// Recipient address, repeatable
    #[structopt(short, long)]
    to: Vec<String>,

    /// Recipient display name, positional with --to
    #[structopt(long)]
    toname: Vec<String>,

    #[structopt(short, long)]
    subject: String,

    #[structopt(long)]
    text: Option<String>,

    #[structopt(long)]
    html: Option<String>,

    #[structopt(long)]
    replyto: Option<String>,

    /// Attachment path, repeatable
    #[structopt(short, long)]
    attach: Vec<PathBuf>,

    /// Custom header as key=value, repeatable
    #[structopt(long)]
    header: Vec<String>,

    /// Category, repeatable
    #[structopt(long)]
    category: Vec<String>,
}

fn build_message(opt: &Opt) -> Result<Message, Error> {
    let mut mail = Message::new()
        .set_from(&opt.from, opt.fromname.as_deref())
        .set_subject(&opt.subject);

    for (i, to) in opt.to.iter().enumerate() {
        mail = mail.add_to(to, opt.toname.get(i).map(|s| s.as_str()));
    }

    if let Some(ref text) = opt.text {
        mail = mail.set_text(text);
    }
    if let Some(ref html) = opt.html {
        mail = mail.set_html(html);
    }
    if let Some(ref replyto) = opt.replyto {
        mail = mail.set_reply_to(replyto);
    }

    for path in &opt.attach {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        mail = mail.add_attachment_file(&name, path)?;
    }

    for header in &opt.header {
        match header.split_once('=') {
            Some((key, value)) => mail = mail.add_header(key, value),
            None => {
                return Err(Error::InvalidArgument(format!(
                    "Header {} is not key=value",
                    header
                )))
            }
        }
    }

    for category in &opt.category {
        mail = mail.add_category(category);
    }

    mail.validate()?;

    Ok(mail)
}

#[tokio::main]
async fn main() {
    // Init logger
    env_logger::builder().format_timestamp_micros().init();

    let opt = Opt::from_args();

    let config = match gridmail::config::load_config(opt.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load config: {}", e);
            std::process::exit(2);
        }
    };

    let mail = match build_message(&opt) {
        Ok(mail) => mail,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    };

    let client = sendgrid::Client::from_config(&config);

    match client.send(&mail).await {
        Ok(resp) => {
            println!("{} {}", resp.code, resp.message);
            std::process::exit(if resp.success { 0 } else { 1 });
        }
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(2);
        }
    }
}
