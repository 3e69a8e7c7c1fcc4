//! Connection descriptor parsing.
//!
//! The descriptor has the form `<username>:<password>@<host>:<port>/<database>`.
//! The password is moved into a `Zeroizing` container as soon as it is split
//! out, and the `Display` and `Debug` forms never include it.

use crate::{Result, error::DumpError};
use zeroize::Zeroizing;

/// Parsed connection descriptor.
#[derive(Clone)]
pub struct ConnectionDescriptor {
    pub username: String,
    password: Zeroizing<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
}

impl ConnectionDescriptor {
    /// Parses a descriptor of the form `<username>:<password>@<host>:<port>/<database>`.
    ///
    /// The descriptor must contain at least two `:`, one `@` and one `/`.
    /// Credentials are everything before the last `@`, so a password may
    /// itself contain `:` or `@`. The host part is split at its first `/`
    /// and then at the last `:` before it.
    ///
    /// # Example
    /// ```rust
    /// use sqlobjectdump_core::connection::ConnectionDescriptor;
    ///
    /// let descriptor = ConnectionDescriptor::parse("sa:secret@db01:1433/Sales").unwrap();
    /// assert_eq!(descriptor.host, "db01");
    /// assert_eq!(descriptor.port, 1433);
    /// assert_eq!(descriptor.to_string(), "sa@db01:1433/Sales");
    /// ```
    ///
    /// # Errors
    /// Returns a configuration error describing the first structural problem.
    /// The error message never echoes the input.
    pub fn parse(input: &str) -> Result<Self> {
        if !has_required_separators(input) {
            return Err(DumpError::configuration(
                "connection must have the form <username>:<password>@<host>:<port>/<database>",
            ));
        }

        let (credentials, location) = input
            .rsplit_once('@')
            .ok_or_else(|| DumpError::configuration("connection is missing '@'"))?;
        let (username, password) = credentials.split_once(':').ok_or_else(|| {
            DumpError::configuration("connection credentials must be <username>:<password>")
        })?;
        let (address, database) = location.split_once('/').ok_or_else(|| {
            DumpError::configuration("connection is missing '/<database>' after the host")
        })?;
        let (host, port) = address
            .rsplit_once(':')
            .ok_or_else(|| DumpError::configuration("connection is missing ':<port>' after the host"))?;

        if username.is_empty() {
            return Err(DumpError::configuration("connection username is empty"));
        }
        if host.is_empty() {
            return Err(DumpError::configuration("connection host is empty"));
        }
        if database.is_empty() {
            return Err(DumpError::configuration("connection database is empty"));
        }
        let port = port.parse::<u16>().map_err(|_| {
            DumpError::configuration(format!("connection port '{port}' is not a valid port"))
        })?;

        Ok(Self {
            username: username.to_string(),
            password: Zeroizing::new(password.to_string()),
            host: host.to_string(),
            port,
            database: database.to_string(),
        })
    }

    /// The password, still held in zeroizing storage.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// `<host>/<database>` segment of the export layout.
    pub fn export_segment(&self) -> (&str, &str) {
        (&self.host, &self.database)
    }
}

/// Structural pre-check: at least two `:`, one `@` and one `/`.
fn has_required_separators(input: &str) -> bool {
    let count = |needle: char| input.chars().filter(|c| *c == needle).count();
    count(':') >= 2 && count('@') >= 1 && count('/') >= 1
}

impl std::fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}:{}/{}",
            self.username, self.host, self.port, self.database
        )
    }
}

impl std::fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("username", &self.username)
            .field("password", &"****")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish()
    }
}
