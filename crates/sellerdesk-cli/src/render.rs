//! テキスト表示

use std::fmt::Write as _;

use sellerdesk_core::app::StatusAction;
use sellerdesk_core::domain::{
    Category, DashboardMetrics, Notification, Product, Seller, ViewsSeries,
};
use sellerdesk_core::ports::Notifier;

const BAR_WIDTH: u64 = 40;

/// 通知を stderr に出す
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        eprintln!("{notification}");
    }
}

pub fn seller(seller: &Seller) -> String {
    let mut out = format!("{} <{}>\n  id:    {}\n  phone: {}\n", seller.name, seller.email, seller.id, seller.phone);
    if let Some(avatar) = &seller.avatar {
        let _ = writeln!(out, "  avatar: {}", avatar.url);
    }
    out
}

pub fn categories(categories: &[Category]) -> String {
    categories
        .iter()
        .map(|c| format!("{}  {}\n", c.id, c.title))
        .collect()
}

pub fn product_rows(products: &[Product]) -> String {
    if products.is_empty() {
        return "no products\n".to_string();
    }
    products
        .iter()
        .map(|p| format!("{}  {:<9}  {:>10}  {}\n", p.id, p.status, p.price_in_cents, p.title))
        .collect()
}

pub fn product(product: &Product) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", product.title, product.id);
    let _ = writeln!(out, "  status:   {}", product.status);
    let _ = writeln!(out, "  price:    {}", product.price_in_cents);
    let _ = writeln!(out, "  category: {}", product.category.title);
    if let Some(owner) = &product.owner {
        let _ = writeln!(out, "  owner:    {}", owner.name);
    }
    let _ = writeln!(out, "  {}", product.description);
    for attachment in &product.attachments {
        let _ = writeln!(out, "  image:    {}", attachment.url);
    }
    out
}

pub fn actions(actions: &[StatusAction]) -> String {
    actions.iter().map(|a| format!("{a}\n")).collect()
}

pub fn dashboard(metrics: &DashboardMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "products sold (30 days):      {}", metrics.products_sold);
    let _ = writeln!(out, "products available (30 days): {}", metrics.products_available);
    let _ = writeln!(out, "visitors (30 days):           {}", metrics.seller_views);
    out.push_str(&views_chart(&metrics.views_per_day));
    out
}

/// 1 日 1 行の棒グラフ
pub fn views_chart(series: &ViewsSeries) -> String {
    let Some((first, last)) = series.period() else {
        return "no views yet\n".to_string();
    };
    let max = series.points().iter().map(|p| p.amount).max().unwrap_or(0);

    let mut out = format!("views per day {} → {}\n", first.format("%d/%m"), last.format("%d/%m"));
    for point in series.points() {
        let width = if max == 0 { 0 } else { point.amount * BAR_WIDTH / max };
        let _ = writeln!(
            out,
            "  {} {:>4} {}",
            point.date.format("%d/%m"),
            point.amount,
            "#".repeat(width as usize)
        );
    }
    if let Some(peak) = series.peak() {
        let _ = writeln!(out, "peak: {} on {}", peak.amount, peak.date.format("%d/%m"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sellerdesk_core::domain::{CategoryId, DailyViews, PriceInCents, ProductId, ProductStatus};

    fn listed(id: &str, status: ProductStatus, cents: u64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("item {id}"),
            description: String::new(),
            price_in_cents: PriceInCents::new(cents),
            status,
            owner: None,
            category: Category {
                id: CategoryId::new("c1"),
                title: "Toys".into(),
                slug: "toys".into(),
            },
            attachments: vec![],
        }
    }

    #[test]
    fn product_rows_line_up() {
        let rows = product_rows(&[
            listed("p1", ProductStatus::Sold, 1250),
            listed("p2", ProductStatus::Available, 120050),
        ]);
        let lines: Vec<_> = rows.lines().collect();
        assert_eq!(lines[0], "p1  sold            12.50  item p1");
        assert_eq!(lines[1], "p2  available     1200.50  item p2");
    }

    fn day(d: u32, amount: u64) -> DailyViews {
        DailyViews {
            date: NaiveDate::from_ymd_opt(2024, 7, d).unwrap(),
            amount,
        }
    }

    #[test]
    fn chart_scales_to_the_busiest_day() {
        let chart = views_chart(&ViewsSeries::new(vec![day(2, 4), day(1, 2)]));
        let lines: Vec<_> = chart.lines().collect();
        assert_eq!(lines[0], "views per day 01/07 → 02/07");
        assert!(lines[1].ends_with(&"#".repeat(20)));
        assert!(lines[2].ends_with(&"#".repeat(40)));
        assert_eq!(lines[3], "peak: 4 on 02/07");
    }

    #[test]
    fn empty_series() {
        assert_eq!(views_chart(&ViewsSeries::default()), "no views yet\n");
    }
}
