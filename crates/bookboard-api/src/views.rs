//! Page templates. Every page carries the flashes and the logged-in username
//! used by `base.html`.

use askama::Template;
use askama_web::WebTemplate;

use bookboard_types::models::{Message, Notice, Threads};

/// One conversation as shown to the notice owner.
pub struct ThreadView {
    pub anon_id: String,
    pub messages: Vec<Message>,
}

impl ThreadView {
    pub fn from_threads(threads: Threads) -> Vec<Self> {
        threads
            .into_iter()
            .map(|(anon_id, messages)| Self { anon_id, messages })
            .collect()
    }
}

pub struct DashboardEntry {
    pub notice: Notice,
    pub threads: Vec<ThreadView>,
}

#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub flashes: Vec<String>,
    pub username: Option<String>,
    pub notices: Vec<Notice>,
}

#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub flashes: Vec<String>,
    pub username: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub flashes: Vec<String>,
    pub username: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub flashes: Vec<String>,
    pub username: Option<String>,
    pub entries: Vec<DashboardEntry>,
}

#[derive(Template, WebTemplate)]
#[template(path = "chat.html")]
pub struct ChatTemplate {
    pub flashes: Vec<String>,
    pub username: Option<String>,
    pub notice: Notice,
    pub anon_id: String,
    pub messages: Vec<Message>,
    pub is_owner: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "conversations.html")]
pub struct ConversationsTemplate {
    pub flashes: Vec<String>,
    pub username: Option<String>,
    pub notice: Notice,
    pub threads: Vec<ThreadView>,
}
