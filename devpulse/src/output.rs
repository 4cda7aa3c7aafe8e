//! Plain-text rendering of metric results.

use devpulse_core::metrics::{
    CalculatedMetrics, GroupedRatio, GroupedTotal, LanguageBreakdown, MetricsReport,
    PeriodBreakdown, ProductivitySeries, UsersBucket,
};
use devpulse_core::Period;

fn header(title: &str) {
    println!();
    println!("{}", title);
    println!("{}", "=".repeat(title.chars().count()));
}

pub fn print_productivity(metrics: &CalculatedMetrics) {
    header(&format!(
        "Productivity for {} ({}, by {})",
        metrics.owner_id, metrics.metric, metrics.period
    ));

    if metrics.series.is_empty() {
        println!("No commits found for this window.");
        println!();
        return;
    }

    println!("Languages: {}", metrics.languages.join(", "));
    println!();
    print_series(&metrics.series);
    println!();
}

fn print_series(series: &ProductivitySeries) {
    match series {
        ProductivitySeries::CodeLines(buckets) => {
            println!(
                "{:<12} {:>10} {:>12} {:>10} {:>8}",
                "Bucket", "Changed", "By Copilot", "Copilot %", "Authors"
            );
            for b in buckets {
                println!(
                    "{:<12} {:>10} {:>12} {:>9.1}% {:>8}",
                    b.bucket_start.to_string(),
                    b.net_changed_lines,
                    b.net_changed_lines_by_copilot,
                    100.0 * b.percentage_changed_lines_by_copilot,
                    b.distinct_author_count
                );
            }
        }
        ProductivitySeries::CommitCount(buckets) => {
            println!(
                "{:<12} {:>8} {:>11} {:>8}",
                "Bucket", "Commits", "Accepted %", "Authors"
            );
            for b in buckets {
                println!(
                    "{:<12} {:>8} {:>10.1}% {:>8}",
                    b.bucket_start.to_string(),
                    b.total_commits,
                    100.0 * b.percentage_ai_suggestions_accepted,
                    b.distinct_author_count
                );
            }
        }
    }
}

pub fn print_languages(breakdown: &[LanguageBreakdown]) {
    header("Copilot usage by language");
    print_language_table(breakdown);
    println!();
}

fn print_language_table(breakdown: &[LanguageBreakdown]) {
    if breakdown.is_empty() {
        println!("No Copilot usage found for this window.");
        return;
    }

    println!(
        "{:<14} {:>9} {:>10} {:>7} {:>10} {:>11} {:>8}",
        "Language", "Accepted", "Suggested", "Acc %", "Lines acc", "Lines sugg", "Lines %"
    );
    for b in breakdown {
        println!(
            "{:<14} {:>9} {:>10} {:>6.1}% {:>10} {:>11} {:>7.1}%",
            b.language,
            b.code_acceptances,
            b.code_suggestions,
            b.pct_code_acceptances,
            b.lines_accepted,
            b.lines_suggested,
            b.pct_lines_accepted
        );
    }
}

pub fn print_usage(period: Period, breakdown: &[PeriodBreakdown]) {
    header(&format!("Copilot usage by {}", period));
    print_usage_table(breakdown);
    println!();
}

fn print_usage_table(breakdown: &[PeriodBreakdown]) {
    if breakdown.is_empty() {
        println!("No Copilot usage found for this window.");
        return;
    }

    println!(
        "{:<12} {:>9} {:>7} {:>10} {:>8}",
        "Period", "Accepted", "Acc %", "Lines acc", "Lines %"
    );
    for b in breakdown {
        println!(
            "{:<12} {:>9} {:>6.1}% {:>10} {:>7.1}%",
            b.period_start.to_string(),
            b.total_code_acceptances,
            100.0 * b.pct_code_acceptances,
            b.total_lines_accepted,
            100.0 * b.pct_lines_accepted
        );
    }
}

pub fn print_users(users: &[UsersBucket]) {
    header("Copilot users per day");
    print_users_table(users);
    println!();
}

fn print_users_table(users: &[UsersBucket]) {
    if users.is_empty() {
        println!("No Copilot users found for this window.");
        return;
    }

    println!("{:<12} {:>11} {:>11}", "Date", "Code users", "Chat users");
    for u in users {
        println!(
            "{:<12} {:>11} {:>11}",
            u.date.to_string(),
            u.total_code_assistant_users,
            u.total_chat_users
        );
    }
}

pub fn print_report(report: &MetricsReport) {
    header(&format!(
        "Metrics report for {} as of {}",
        report.owner_id, report.as_of
    ));

    if report.is_empty() {
        println!("No activity found for this report.");
        println!();
        return;
    }

    for (title, metrics) in [
        ("WEEKLY PRODUCTIVITY", &report.weekly_productivity),
        ("MONTHLY PRODUCTIVITY", &report.monthly_productivity),
    ] {
        println!();
        println!("{}", title);
        if metrics.series.is_empty() {
            println!("No commits found for this window.");
        } else {
            print_series(&metrics.series);
        }
    }

    println!();
    println!("LANGUAGES");
    print_language_table(&report.languages);

    println!();
    println!("DAILY USAGE");
    print_usage_table(&report.daily_usage);

    println!();
    println!("USERS");
    print_users_table(&report.users);
    println!();
}

fn key_column(dimensions: &[&str]) -> String {
    dimensions.join(" / ")
}

pub fn print_grouped_totals(dimensions: &[&str], totals: &[GroupedTotal]) {
    header(&format!("Changed lines by {}", key_column(dimensions)));

    if totals.is_empty() {
        println!("No commits found for this window.");
        println!();
        return;
    }

    for t in totals {
        println!("{:<40} {:>10}", t.key.join(" / "), t.value);
    }
    println!();
}

pub fn print_grouped_ratios(dimensions: &[&str], ratios: &[GroupedRatio]) {
    header(&format!("Copilot lines by {}", key_column(dimensions)));

    if ratios.is_empty() {
        println!("No Copilot usage found for this window.");
        println!();
        return;
    }

    println!(
        "{:<40} {:>10} {:>11} {:>8}",
        "Group", "Accepted", "Suggested", "Ratio"
    );
    for r in ratios {
        println!(
            "{:<40} {:>10} {:>11} {:>7.1}%",
            r.key.join(" / "),
            r.accepted,
            r.suggested,
            100.0 * r.ratio
        );
    }
    println!();
}
