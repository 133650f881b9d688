//! Interface de terminal do statusfile — barra de progresso e saída colorida.
//!
//! Usa as crates `indicatif` para progresso e `console` para estilização
//! com cores. O [`StatusProgress`] acompanha visualmente o escritor e os
//! leitores enquanto disputam o mesmo arquivo de status.

use chrono::Local;
use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::WatchError;
use crate::harness::{DemoReport, ReaderStats};
use crate::status::StatusRecord;

/// Indicador visual de progresso para os loops de escrita e leitura.
///
/// Escritas aparecem em ciano, leituras em amarelo, e o resumo final
/// em verde (sem leituras corrompidas) ou vermelho.
#[derive(Clone)]
pub struct StatusProgress {
    // Barra de progresso (com total conhecido) ou spinner.
    pb: ProgressBar,
    // Estilo verde para sucesso.
    green: Style,
    // Estilo vermelho para falhas.
    red: Style,
    // Estilo amarelo para leituras.
    yellow: Style,
    // Estilo ciano para escritas.
    cyan: Style,
}

impl StatusProgress {
    /// Inicia uma barra com `total` escritas, ou um spinner se o total for desconhecido.
    pub fn start(total: Option<u64>) -> Self {
        let pb = match total {
            Some(total) => {
                let pb = ProgressBar::new(total);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                        .expect("invalid template"),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.cyan} {pos} writes {msg}")
                        .expect("invalid template"),
                );
                pb
            }
        };
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            pb,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
        }
    }

    /// Registra uma escrita concluída e avança a barra.
    pub fn wrote(&self, record: &StatusRecord) {
        self.emit(format!(
            "{} {} Writing content {record}",
            timestamp(),
            self.cyan.apply_to("<-")
        ));
        self.pb.set_message(record.to_string());
        self.pb.inc(1);
    }

    /// Registra uma mudança observada por um leitor.
    pub fn read(&self, reader: usize, record: &StatusRecord) {
        self.emit(format!(
            "{} {}    Reader {reader} read content {record}",
            timestamp(),
            self.yellow.apply_to("->")
        ));
    }

    /// Finaliza a barra e exibe o resultado de cada leitor.
    pub fn finish_demo(&self, report: &DemoReport) {
        self.pb.finish_and_clear();
        if report.interrupted {
            println!("  {} Interrupted", self.yellow.apply_to("!"));
        }
        println!("  Published {} records", report.published);
        for (id, result) in report.readers.iter().enumerate() {
            println!("  Reader {id}: {}", self.describe(result));
        }
        if report.is_clean() {
            println!("  {} No torn reads", self.green.apply_to("✓"));
        } else {
            println!(
                "  {} {} reader(s) failed",
                self.red.apply_to("✗"),
                report.failures()
            );
        }
    }

    /// Finaliza a barra após o loop de escrita isolado.
    pub fn finish_churn(&self, written: u64) {
        self.pb.finish_and_clear();
        println!("  {} Wrote {written} records", self.green.apply_to("✓"));
    }

    /// Descreve o resultado de um leitor em uma linha colorida.
    pub fn describe(&self, result: &Result<ReaderStats, WatchError>) -> String {
        match result {
            Ok(stats) => format!(
                "{} {} reads, {} misses, {} changes",
                self.green.apply_to("ok"),
                stats.reads,
                stats.misses,
                stats.changes
            ),
            Err(err) => format!("{} {err}", self.red.apply_to("failed")),
        }
    }

    // Barras ocultas (saída sem terminal) descartam `println`.
    fn emit(&self, line: String) {
        if self.pb.is_hidden() {
            println!("{line}");
        } else {
            self.pb.println(line);
        }
    }
}

/// Imprime o registro lido, ou avisa que nada foi publicado ainda.
pub fn print_record(record: Option<&StatusRecord>) {
    match record {
        Some(record) => println!(
            "{}",
            serde_json::to_string_pretty(record).unwrap_or_else(|_| record.to_string())
        ),
        None => println!("{}", Style::new().yellow().apply_to("no status yet")),
    }
}

/// Imprime uma mudança observada pelo comando `watch`.
pub fn print_observed(record: &StatusRecord) {
    println!(
        "{} {}    Read content {record}",
        timestamp(),
        Style::new().yellow().apply_to("->")
    );
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S%.3f").to_string()
}
