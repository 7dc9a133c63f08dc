use crate::runner::ResultSet;
use colored::Colorize;

pub struct RunnerReporter {
    verbose: bool,
}

impl RunnerReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// 一行结果统计
    pub fn summary_line(&self, results: &ResultSet) -> String {
        if results.failed() == 0 {
            format!(
                "{}: {} passed, {} total",
                "Tests".bold(),
                results.passed().to_string().green(),
                results.total()
            )
        } else {
            format!(
                "{}: {} passed, {} failed, {} total",
                "Tests".bold(),
                results.passed().to_string().green(),
                results.failed().to_string().red(),
                results.total()
            )
        }
    }

    /// 某个 Runner 的结果摘要
    pub fn format_summary(&self, name: Option<&str>, results: &ResultSet) -> String {
        let mut output = Vec::new();
        output.push("━".repeat(50));
        output.push(name.unwrap_or("(unnamed runner)").bold().to_string());
        output.push("━".repeat(50));

        // 失败的测试总是列出，verbose 时列出全部
        for outcome in results.tests() {
            if !(self.verbose || outcome.failed()) {
                continue;
            }
            let symbol = if outcome.failed() { "✗".red() } else { "✓".green() };
            output.push(format!(
                "  {} {}",
                symbol,
                outcome.name().unwrap_or("(unnamed test)")
            ));
        }

        if let Some(error) = results.top_level_error() {
            output.push(format!("  {}: {}", "Error".red().bold(), error));
        }

        output.push(format!("  {}", self.summary_line(results)));
        if !results.all() {
            output.push(format!("  {}", "(incomplete)".dimmed()));
        }
        output.join("\n")
    }

    /// 打印某个 Runner 的结果摘要
    pub fn print_summary(&self, name: Option<&str>, results: &ResultSet) {
        println!("\n{}\n", self.format_summary(name, results));
    }

    /// 打印进程输出
    pub fn print_log(&self, name: &str, output: &str) {
        println!("{} {}", "Output of".dimmed(), name.bold());
        for line in output.lines() {
            println!("   {}", line);
        }
    }
}

impl Default for RunnerReporter {
    fn default() -> Self {
        Self::new(false)
    }
}
