//! HTML fragments and number formatting for the release panel.

use crate::github::Release;

/// Group digits by thousands: `1234567` -> `"1,234,567"`.
pub fn format_number(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Bytes as MiB with two decimals.
pub fn format_mib(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / 1_048_576.0)
}

/// Day part of an ISO-8601 timestamp.
pub fn date_part(ts: &str) -> &str {
    ts.split('T').next().unwrap_or(ts)
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Banner with the grand total of downloads, or nothing when zero.
pub fn total_downloads_html(total: u64) -> String {
    if total == 0 {
        return String::new();
    }
    format!(
        "<div class=\"total-downloads\"><h4><span>{}</span>&nbsp;Total Downloads</h4></div>",
        format_number(total)
    )
}

/// One block per release: tag, author, publish date, downloads and assets.
pub fn release_html(release: &Release) -> String {
    let mut html = String::from("<div class=\"release\">");

    html.push_str(&format!(
        "<h3><a href=\"{}\" target=\"_blank\" rel=\"noreferrer\">{}</a>",
        html_escape(&release.html_url),
        html_escape(&release.tag_name)
    ));
    if release.prerelease {
        html.push_str("&nbsp;&nbsp;<span class=\"badge prerelease\">Pre-release</span>");
    }
    html.push_str("</h3><hr>");

    html.push_str("<h4>Release Info</h4><ul>");
    if let Some(author) = &release.author {
        html.push_str(&format!(
            "<li>Author: <a href=\"{}\">@{}</a></li>",
            html_escape(&author.html_url),
            html_escape(&author.login)
        ));
    }
    if let Some(published) = &release.published_at {
        html.push_str(&format!("<li>Published: {}</li>", html_escape(date_part(published))));
    }
    let downloads = release.download_count();
    if downloads > 0 {
        html.push_str(&format!("<li>Downloads: {}</li>", format_number(downloads)));
    }
    html.push_str("</ul>");

    if !release.assets.is_empty() {
        html.push_str("<h4>Download Info</h4><ul>");
        for asset in &release.assets {
            let updated = asset.updated_at.as_deref().map(date_part).unwrap_or("unknown");
            html.push_str(&format!(
                "<li><code>{}</code> ({}&nbsp;MiB,&nbsp;{}) - downloaded {}&nbsp;times.</li>",
                html_escape(&asset.name),
                format_mib(asset.size),
                html_escape(updated),
                format_number(asset.download_count)
            ));
        }
        html.push_str("</ul>");
    }

    html.push_str("</div>");
    html
}

/// The whole release panel: total banner first, then each release.
pub fn releases_html(releases: &[Release]) -> String {
    let total: u64 = releases.iter().map(Release::download_count).sum();
    let body: String = releases.iter().map(release_html).collect();
    format!("{}<div class=\"releases\">{}</div>", total_downloads_html(total), body)
}
