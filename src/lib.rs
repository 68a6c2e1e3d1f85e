use anyhow::Error;
use scraper::Selector;
use tracing::info;

pub mod details;
pub mod login;
pub mod navigation;
pub mod options;
pub mod publish;
pub mod session;

pub use details::{extract_details, FundDetails};
pub use login::{login, Credentials, LoginForm};
pub use navigation::{find_pension_link, open_pension_details};
pub use options::{Options, SaveTarget, UsageError};
pub use publish::{publish, Row, ServiceAccountKey, SheetsClient};
pub use session::Session;

pub type Result<T> = std::result::Result<T, Error>;

pub const PROVIDER_HOST: &str = "https://ae.nowpensions.com";
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

const LOGIN_PATH: &str = "/Login.aspx";
const LOGIN_FORM: &str = "#aspnetForm";
const SUBMIT_FIELD: &str = "ctl01$ctl00$SiteContentPlaceHolder$ContentMainBody$ctlLogin$Login";
const SUBMIT_VALUE: &str = "Login";
const PENSION_LINK_TITLE: &str = "My Workplace Pension";
const FUND_VALUE_PREFIX: char = '£';
const EFFECTIVE_DATE_LABEL: &str = "Effective as at:";

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::msg(format!("invalid selector {css:?}: {e:?}")))
}

/// Logs in, follows the pension link and reads the fund details.
///
/// `options` must have passed [`Options::validate`].
pub fn scrape(session: &Session, options: &Options) -> Result<FundDetails> {
    let credentials = Credentials {
        username: options.username(),
        password: options.password(),
    };
    let landing = login(session, credentials)?;
    let page = open_pension_details(session, &landing, options.organisation())?;
    extract_details(&page)
}

/// Outcome of a full run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub details: FundDetails,
    /// Title of the spreadsheet the row was appended to, if `--save` was given.
    pub published_to: Option<String>,
}

/// Runs the whole workflow against `provider_host`, publishing through `sheets_api_base`.
pub fn run_against(
    options: &Options,
    provider_host: &str,
    sheets_api_base: &str,
) -> Result<Report> {
    // Read before the HTTP client starts its worker thread.
    let started = publish::local_now();
    let session = Session::new(provider_host, options.organisation())?;
    info!(base_url = %session.base_url(), "session ready");
    let details = scrape(&session, options)?;

    let published_to = match options.save_target() {
        Some(target) => Some(publish(
            &details,
            started,
            target.key_file,
            target.spreadsheet_id,
            sheets_api_base,
        )?),
        None => None,
    };
    Ok(Report {
        details,
        published_to,
    })
}

pub fn run(options: &Options) -> Result<Report> {
    run_against(options, PROVIDER_HOST, SHEETS_API_BASE)
}
