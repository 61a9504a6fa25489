//! Plain-text rendering of screen state.

#![allow(clippy::print_stdout)]

use shopie_admin::orders::{OrderRow, StatusAction};
use shopie_admin::products::ProductRow;
use shopie_core::{Cart, Order, StockLevel};
use shopie_storefront::presenter::{ConfirmPrompt, Notice, NoticeKind};
use shopie_storefront::screens::ProductCard;

pub fn notice(notice: &Notice) {
    let marker = match notice.kind {
        NoticeKind::Success => "ok",
        NoticeKind::Error => "!!",
    };
    println!("[{marker}] {}: {}", notice.title, notice.message);
}

pub fn declined(prompt: &ConfirmPrompt) {
    println!("{} {} Re-run with --yes to confirm.", prompt.title, prompt.message);
}

fn stock_text(stock: StockLevel) -> String {
    match stock {
        StockLevel::OutOfStock => "out of stock".to_owned(),
        StockLevel::Low(n) => format!("only {n} left"),
        StockLevel::Available(n) => format!("{n} in stock"),
    }
}

pub fn catalog(cards: &[ProductCard], cart_badge: Option<u32>) {
    if cards.is_empty() {
        println!("No products");
    }
    for card in cards {
        let in_cart = if card.show_cart_actions && card.in_cart {
            format!("  [in cart: {}]", card.quantity_in_cart)
        } else {
            String::new()
        };
        println!(
            "#{:<5} {:<30} {:>12}  {}{in_cart}",
            card.product.id,
            card.product.name,
            card.product.display_price(),
            stock_text(card.stock),
        );
    }
    if let Some(count) = cart_badge {
        println!("Cart: {count} item(s)");
    }
}

pub fn cart(cart: &Cart) {
    if cart.items.is_empty() {
        println!("Your cart is empty");
        return;
    }
    for item in &cart.items {
        println!(
            "#{:<5} {:<30} x{:<3} {:>12}",
            item.product.id,
            item.product.name,
            item.quantity,
            item.product.display_price(),
        );
    }
    println!("{} item(s)", cart.item_count());
}

pub fn product_rows(rows: &[ProductRow]) {
    if rows.is_empty() {
        println!("No products");
    }
    for row in rows {
        println!(
            "#{:<5} {:<30} {:>12}  stock {:<5} {}",
            row.id, row.name, row.price, row.stock, row.description
        );
    }
}

pub fn order_rows(rows: &[OrderRow], count_label: &str, empty_message: &str) {
    println!("{count_label}");
    if rows.is_empty() {
        println!("{empty_message}");
    }
    for row in rows {
        println!(
            "Order #{:<6} {}  {:>12}  {}",
            row.id, row.date, row.total, row.status_label
        );
    }
}

pub fn order_detail(order: &Order, actions: &[StatusAction]) {
    println!("Order #{}", order.id);
    println!("  Date:   {}", order.display_date());
    println!("  Total:  {}", order.display_total());
    println!("  Status: {}", order.status.label());
    println!("  Change status to:");
    for action in actions {
        let note = if action.enabled { "" } else { " (current)" };
        println!("    {}{note}", action.status);
    }
}
