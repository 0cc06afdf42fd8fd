/// One line typed into the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Send(String),
    Reload,
    Login(String),
    Logout,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP_TEXT: &str = "\
comandos:
  /reload        recarrega o histórico
  /login <id>    conecta como outro usuário
  /logout        desconecta
  /help          mostra esta ajuda
  /quit          sai
qualquer outro texto é enviado ao assistente";

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix('/') else {
            return Self::Send(line.to_string());
        };

        let (name, argument) = command
            .split_once(char::is_whitespace)
            .map(|(name, argument)| (name, argument.trim()))
            .unwrap_or((command, ""));

        match (name, argument) {
            ("reload", "") => Self::Reload,
            ("login", user_id) if !user_id.is_empty() => Self::Login(user_id.to_string()),
            ("logout", "") => Self::Logout,
            ("help", "") => Self::Help,
            ("quit" | "exit", "") => Self::Quit,
            _ => Self::Unknown(trimmed.to_string()),
        }
    }
}
