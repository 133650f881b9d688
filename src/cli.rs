//! Interface de linha de comando do statusfile baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (write, read, watch,
//! churn, demo) e flags globais (--config, --verbose).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// statusfile — Publicação atômica de registros de status em um arquivo compartilhado.
#[derive(Debug, Parser)]
#[command(name = "statusfile", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho para um arquivo de configuração TOML (padrão: ./statusfile.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Publica um único registro de status.
    Write {
        /// Valor do campo `status`.
        #[arg(long)]
        status: String,

        /// Valor do campo `message`.
        #[arg(long)]
        message: String,

        /// Arquivo de status (sobrescreve a configuração).
        #[arg(long)]
        file: Option<PathBuf>,

        /// Diretório de staging no mesmo filesystem do arquivo de status.
        #[arg(long)]
        staging_dir: Option<PathBuf>,
    },

    /// Lê e imprime o registro atual.
    Read {
        /// Arquivo de status (sobrescreve a configuração).
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Lê o arquivo continuamente até Ctrl-C, validando cada leitura.
    Watch {
        /// Arquivo de status (sobrescreve a configuração).
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Escreve transições aleatórias de status continuamente.
    Churn {
        /// Arquivo de status (sobrescreve a configuração).
        #[arg(long)]
        file: Option<PathBuf>,

        /// Número de escritas; sem limite se omitido.
        #[arg(long)]
        count: Option<u64>,
    },

    /// Executa um escritor contra vários leitores e relata leituras corrompidas.
    Demo {
        /// Número de escritas.
        #[arg(long, default_value_t = 20)]
        count: u64,

        /// Número de leitores concorrentes.
        #[arg(long, default_value_t = 2)]
        readers: usize,

        /// Escreve sem staging (trunca e grava), para observar leituras parciais.
        #[arg(long, default_value_t = false)]
        in_place: bool,
    },
}
