//! Fixed texts the bot sends.

use crate::channels::Sender;
use crate::format::escape_html;

pub const HELP: &str = "<b>Job Beacon</b> searches job sites for you.\n\n\
    1. Type what kind of job you are looking for, e.g. <i>rust developer</i>.\n\
    2. Pick a job site from the keyboard.\n\
    3. Use <b>Next</b> and <b>Previous</b> under a result to browse.\n\n\
    /jobs - pick a job site for your current search\n\
    /exit - forget your search and stop\n\
    /help - show this message";

pub const PICK_SOURCE: &str = "Tap a button below to begin your journey towards your dream job!";

pub const WAIT: &str = "Wait a moment, please... :)";

pub const EXIT: &str = "🚪 You've exited the bot. Your search history has been cleared.\n\
    Type /start to begin again.";

pub const UNRECOGNIZED_ACTION: &str = "Unrecognized action!";

pub const PAGE_INFO: &str = "This is the page information.";

pub const FIRST_RESULT: &str = "This is the first result.";

pub const NO_JOBS_FOUND: &str = "No jobs found for this search. Try another query.";

pub const NO_SOURCES: &str = "No job sites are available right now.";

/// Greeting for `/start`, mentioning the user.
pub fn greeting(sender: &Sender) -> String {
    let name = sender.display_name.as_deref().unwrap_or("there");
    format!(
        "Hi <a href=\"tg://user?id={}\">{}</a>! Welcome to <b>Job Beacon</b> – your personal assistant \
         to exciting career opportunities.\n\
         We bring you real-time alerts from the top job sites, ensuring you never miss a chance to shine.\n\
         Type what kind of job you are looking for to begin your journey towards your dream job!",
        sender.user,
        escape_html(name)
    )
}

pub fn source_selected(source: &str) -> String {
    format!("Job site <b><i>{}</i></b> selected.", escape_html(source))
}

pub fn unknown_command(name: &str) -> String {
    format!("Unknown command /{name}. Type /help to see what I can do.")
}
