//! HTML Pages
//!
//! The demo's four views: unconfigured, connected, read error and write
//! error. All dynamic text is HTML-escaped.

use crate::connection::{ConnectionInfo, ReplicationStatus};

/// Data shared by every configured view
pub struct PageContext<'a> {
    pub server_hostname: &'a str,
    pub info: &'a ConnectionInfo,
    pub status: &'a ReplicationStatus,
}

/// HTML-escape a string
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Fixed-width mask so the password length is not disclosed either
fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        "(empty)"
    } else {
        "********"
    }
}

fn layout(body: &str, server_hostname: &str) -> String {
    format!(
        "<html>\n\
         <head>\n<title>dbpair Demo App</title>\n</head>\n\
         <body>\n\
         {}\n\
         <h1>Server Info</h1>\n\
         <ul>\n<li>hostname: {}</li>\n</ul>\n\
         </body>\n\
         </html>\n",
        body,
        escape_html(server_hostname)
    )
}

/// Value form, optional data section, then the MySQL status list
fn form_body(ctx: &PageContext<'_>, data: &str) -> String {
    let primary = ctx.info.primary();
    let replica = ctx.info.replica();

    format!(
        "<h1>New Value (to primary)</h1>\n\
         <form action=\"/\" method=\"post\">\n\
         <input name=\"value\" type=\"text\"/>\n\
         <input type=\"submit\"/>\n\
         </form>\n\
         {}\n\
         <h1>MySQL Status</h1>\n\
         <ul>\n\
         <li>username: {}</li>\n\
         <li>password: {}</li>\n\
         <li>primary: {} - {}</li>\n\
         <li>replica: {} - {}</li>\n\
         <li>replicating: {}</li>\n\
         </ul>",
        data,
        escape_html(ctx.info.username()),
        mask(ctx.info.password()),
        escape_html(primary.hostname()),
        escape_html(&ctx.status.primary.to_string()),
        escape_html(replica.hostname()),
        escape_html(&ctx.status.replica.to_string()),
        if ctx.status.replicating { "True" } else { "False" },
    )
}

/// Shown while the connection keys are not available
pub fn unconfigured(server_hostname: &str) -> String {
    layout(
        "<h1>Error</h1>\n<p>Missing Database Connection Info. Provide the mysql-username, \
         mysql-password, mysql-master and mysql-slave keys.</p>",
        server_hostname,
    )
}

/// Values read from the replica
pub fn connected(ctx: &PageContext<'_>, values: &[String]) -> String {
    let items = if values.is_empty() {
        "<li>No data yet - make a request</li>".to_string()
    } else {
        values
            .iter()
            .map(|v| format!("<li>{}</li>", escape_html(v)))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let data = format!("<h1>Read values (from replica)</h1>\n<ol>\n{}\n</ol>", items);
    layout(&form_body(ctx, &data), ctx.server_hostname)
}

/// The replica could not be reached
pub fn read_error(ctx: &PageContext<'_>, error: &str) -> String {
    let data = format!(
        "<h1>Error</h1>\n\
         <p>No connection to the replica database could be established.</p>\n\
         <p>The error was: {}</p>",
        escape_html(error)
    );
    layout(&form_body(ctx, &data), ctx.server_hostname)
}

/// The primary could not be reached
pub fn write_error(server_hostname: &str, error: &str) -> String {
    let body = format!(
        "<h1>Error</h1>\n\
         <p>No connection to the primary database could be established.</p>\n\
         <p>The error was: {}</p>",
        escape_html(error)
    );
    layout(&body, server_hostname)
}

/// Any other failure while serving the page
pub fn internal_error(server_hostname: &str, error: &str) -> String {
    let body = format!(
        "<h1>Error</h1>\n<p>The request failed: {}</p>",
        escape_html(error)
    );
    layout(&body, server_hostname)
}
