use std::fmt;

/// The AWS service a server process exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    DataZone,
    Glue,
    Athena,
    S3,
}

impl Service {
    pub const ALL: [Service; 4] = [Self::DataZone, Self::Glue, Self::Athena, Self::S3];

    /// Lowercase identifier used in paths and server names.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::DataZone => "datazone",
            Self::Glue => "glue",
            Self::Athena => "athena",
            Self::S3 => "s3",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::DataZone => "DataZone",
            Self::Glue => "Glue",
            Self::Athena => "Athena",
            Self::S3 => "S3",
        }
    }

    /// `<service>-mcp-server`, as reported by health and initialize.
    pub fn server_name(&self) -> String {
        format!("{}-mcp-server", self.slug())
    }

    /// Path of the JSON-RPC endpoint on the HTTP transport.
    pub fn rpc_path(&self) -> String {
        format!("/mcp/{}", self.slug())
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Self::DataZone => 8080,
            Self::Glue => 8081,
            Self::Athena => 8082,
            Self::S3 => 8083,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
