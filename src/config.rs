//! Configuração do statusfile carregada a partir de `statusfile.toml`.
//!
//! A struct [`StatusConfig`] contém todos os parâmetros configuráveis do harness.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `STATUSFILE_STAGING_DIR` tem precedência sobre o arquivo.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::harness::Choices;

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "statusfile.toml";

/// Variável de ambiente que sobrescreve o diretório de staging.
pub const STAGING_DIR_ENV: &str = "STATUSFILE_STAGING_DIR";

/// Configuração de nível superior carregada de `statusfile.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusConfig {
    /// Caminho do arquivo de status observado pelos leitores.
    #[serde(default = "default_status_file")]
    pub status_file: PathBuf,

    /// Diretório de staging; precisa estar no mesmo filesystem do arquivo de status.
    #[serde(default)]
    pub staging_dir: Option<PathBuf>,

    /// Valores de status aceitos pelos leitores e sorteados pelo escritor.
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,

    /// Mensagens aceitas pelos leitores e sorteadas pelo escritor.
    #[serde(default = "default_messages")]
    pub messages: Vec<String>,

    /// Intervalo máximo, em milissegundos, entre duas publicações do escritor.
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
}

// Valor padrão para o arquivo de status: "status.json".
fn default_status_file() -> PathBuf {
    PathBuf::from("status.json")
}

fn default_statuses() -> Vec<String> {
    ["running", "error", "success"].map(String::from).to_vec()
}

fn default_messages() -> Vec<String> {
    ["Doing stuff", "Other stuff", "More stuff"]
        .map(String::from)
        .to_vec()
}

// Valor padrão para o intervalo máximo: 1000ms.
fn default_max_interval_ms() -> u64 {
    1000
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            status_file: default_status_file(),
            staging_dir: None,
            statuses: default_statuses(),
            messages: default_messages(),
            max_interval_ms: default_max_interval_ms(),
        }
    }
}

impl StatusConfig {
    /// Carrega a configuração de `statusfile.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        let path = Path::new(CONFIG_FILE);
        let config = if path.exists() {
            Self::parse_file(path)?
        } else {
            Self::default()
        };
        config.finish(std::env::var(STAGING_DIR_ENV).ok())
    }

    /// Carrega a configuração de um caminho explícito (`--config`).
    /// Aqui o arquivo precisa existir.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::parse_file(path)?.finish(std::env::var(STAGING_DIR_ENV).ok())
    }

    /// Conjunto de valores que o escritor sorteia e os leitores aceitam.
    pub fn choices(&self) -> Choices {
        Choices::new(self.statuses.clone(), self.messages.clone())
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str::<StatusConfig>(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    // Aplica a variável de ambiente e valida o resultado.
    fn finish(mut self, staging_override: Option<String>) -> Result<Self> {
        // Variável de ambiente tem precedência sobre o arquivo para o diretório de staging.
        if let Some(dir) = staging_override
            && !dir.is_empty()
        {
            self.staging_dir = Some(PathBuf::from(dir));
        }

        if self.statuses.is_empty() {
            bail!("config error: `statuses` must not be empty");
        }
        if self.messages.is_empty() {
            bail!("config error: `messages` must not be empty");
        }
        Ok(self)
    }
}
