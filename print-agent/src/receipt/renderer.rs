//! Receipt renderer
//!
//! Renders an [`OrderSession`] into receipt markup for one printer profile.

use chrono_tz::Tz;
use rust_decimal::Decimal;
use shared::models::{DishOrder, OrderSession, PrinterProfile};

use super::format::{format_price, format_quantity, format_time};
use super::logo::logo_base64;
use super::markup::{Align, Cell, MarkupBuilder, TextSize};
use super::profile::WidthProfile;

const TITLE: &str = "HÓA ĐƠN";
const NOTE_INDENT: usize = 2;

/// Markup for one printer, with the line width it was laid out for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptDocument {
    pub cpl: usize,
    pub markup: String,
}

/// Customer receipt renderer
///
/// Output only depends on its inputs: the same order and profile always give
/// the same markup.
#[derive(Debug, Clone, Copy)]
pub struct ReceiptRenderer {
    timezone: Tz,
}

impl ReceiptRenderer {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    /// Render an order for one printer
    pub fn render(
        &self,
        session: &OrderSession,
        printer: &PrinterProfile,
        is_preview: bool,
    ) -> ReceiptDocument {
        let widths = WidthProfile::for_size(printer.size);
        let mut b = MarkupBuilder::new();

        self.render_header(&mut b, session);
        self.render_info(&mut b, session, widths);
        self.render_items(&mut b, session, printer, widths);

        let show_totals =
            !session.is_reprint() && !is_preview && !printer.do_not_include_price_in_bill;
        if show_totals {
            self.render_totals(&mut b, session, widths);
        }

        self.render_footer(&mut b, session, printer);

        ReceiptDocument {
            cpl: widths.cpl,
            markup: b.finalize(),
        }
    }

    fn render_header(&self, b: &mut MarkupBuilder, session: &OrderSession) {
        b.full_width();
        b.row(&[Cell::center(&session.restaurant_name).bold()]);
        if let Some(address) = &session.restaurant_address
            && !address.trim().is_empty()
        {
            b.row(&[Cell::center(address)]);
        }

        b.rule();
        b.row(&[Cell::center(TITLE).bold().size(TextSize::Double)]);
        b.row(&[Cell::center(format!("Mã ĐH:{}", session.bill_no)).bold()]);
        b.blank();
    }

    fn render_info(&self, b: &mut MarkupBuilder, session: &OrderSession, widths: &WidthProfile) {
        b.columns(&widths.info);
        b.row(&[
            Cell::left(&session.representative_name).bold(),
            Cell::right(format_time(&session.created_at, self.timezone)),
        ]);
        b.row(&[Cell::left(&session.representative_phone)]);
        b.row(&[
            Cell::left(format!("Số người: {}", session.number_of_customers)),
            Cell::right(format!("Bàn: {}", session.table_names.join(","))),
        ]);
        b.rule();
    }

    fn render_items(
        &self,
        b: &mut MarkupBuilder,
        session: &OrderSession,
        printer: &PrinterProfile,
        widths: &WidthProfile,
    ) {
        b.columns(&widths.items);
        b.row(&[
            Cell::left("Món").bold(),
            Cell::center("SL").bold(),
            Cell::right("Thành tiền").bold(),
        ]);
        b.rule();

        for dish in session.dish_orders().filter(|d| printer.accepts(&d.dish_type)) {
            self.render_item(b, dish, printer);
            b.blank();
            // Restore item columns after a full-width note
            b.columns(&widths.items);
        }
    }

    fn render_item(&self, b: &mut MarkupBuilder, dish: &DishOrder, printer: &PrinterProfile) {
        let price = if printer.do_not_include_price_in_bill {
            String::new()
        } else {
            format_price(dish.price)
        };
        b.row(&[
            Cell::left(&dish.dish_name),
            Cell::center(format_quantity(dish.quantity)).bold(),
            Cell::right(price).bold(),
        ]);

        if printer.include_note_in_bill
            && let Some(note) = &dish.note
            && !note.trim().is_empty()
        {
            b.full_width();
            b.row(&[Cell::left(note).indent(NOTE_INDENT)]);
        }
    }

    fn render_totals(&self, b: &mut MarkupBuilder, session: &OrderSession, widths: &WidthProfile) {
        b.rule();
        b.columns(&widths.totals);
        b.row(&[
            Cell::left("Tổng"),
            Cell::right(format_price(session.pretax_payment_amount)),
        ]);
        if session.tax_payment_amount > Decimal::ZERO {
            b.row(&[
                Cell::left("VAT"),
                Cell::right(format_price(session.tax_payment_amount)),
            ]);
        }

        b.rule();
        b.row(&[
            Cell::left("Tổng tiền").bold(),
            Cell::right(format_price(session.payment_amount)).bold(),
        ]);

        if session.customer_paid_amount > Decimal::ZERO {
            b.rule();
            b.row(&[
                Cell::left("Tiền khách đưa"),
                Cell::right(format_price(session.customer_paid_amount)),
            ]);
            b.row(&[
                Cell::left("Trả lại"),
                Cell::right(format_price(session.return_amount)),
            ]);
        }
    }

    fn render_footer(&self, b: &mut MarkupBuilder, session: &OrderSession, printer: &PrinterProfile) {
        b.blank();
        b.full_width();
        b.image(logo_base64());

        if printer.include_order_detail_number && session.is_reprint() {
            b.boxed(Align::Center);
            b.row(&[Cell::center(format!("Lần {}", session.sequence_number())).bold()]);
        }

        b.cut();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{OrderDetail, PaperSize};

    fn renderer() -> ReceiptRenderer {
        ReceiptRenderer::new(chrono_tz::Asia::Ho_Chi_Minh)
    }

    fn dish(name: &str, dish_type: &str, price: i64) -> DishOrder {
        DishOrder {
            dish_name: name.to_string(),
            quantity: Decimal::from(2),
            price: Decimal::from(price),
            dish_type: dish_type.to_string(),
            note: None,
        }
    }

    fn session(dishes: Vec<DishOrder>) -> OrderSession {
        OrderSession {
            restaurant_name: "Quán Ngon".to_string(),
            restaurant_address: Some("12 Lý Thái Tổ".to_string()),
            bill_no: "B-1024".to_string(),
            representative_name: "Lan".to_string(),
            representative_phone: "0901234567".to_string(),
            created_at: "2024-05-16T07:33:50.000Z".to_string(),
            number_of_customers: 4,
            table_names: vec!["A1".to_string(), "A2".to_string()],
            pretax_payment_amount: Decimal::from(100000),
            tax_payment_amount: Decimal::from(10000),
            payment_amount: Decimal::from(110000),
            customer_paid_amount: Decimal::ZERO,
            return_amount: Decimal::ZERO,
            order_details: vec![OrderDetail { dish_order: dishes }],
            order_detail_number: None,
        }
    }

    fn printer(size: PaperSize) -> PrinterProfile {
        PrinterProfile {
            size,
            printer_host: "192.168.1.50".to_string(),
            printer_port: 9100,
            do_not_include_price_in_bill: false,
            include_note_in_bill: false,
            include_order_detail_number: false,
            dish_types: vec!["food".to_string()],
        }
    }

    fn item_rows(markup: &str) -> usize {
        markup
            .lines()
            .filter(|l| l.starts_with('|') && l.contains("|\"2|"))
            .count()
    }

    #[test]
    fn test_empty_order_keeps_header_and_table_head() {
        let doc = renderer().render(&session(vec![]), &printer(PaperSize::Mm80), false);

        assert_eq!(doc.cpl, 48);
        assert!(doc.markup.contains("|\"Quán Ngon|"));
        assert!(doc.markup.contains("|12 Lý Thái Tổ|"));
        assert!(doc.markup.contains("|\"^^^HÓA ĐƠN|"));
        assert!(doc.markup.contains("|\"Mã ĐH:B-1024|"));
        assert!(doc.markup.contains("|\"Lan | 14:33|"));
        assert!(doc.markup.contains("|Số người: 4 | Bàn: A1,A2|"));
        assert!(doc.markup.contains("|\"Món |\"SL| \"Thành tiền|"));
        assert_eq!(item_rows(&doc.markup), 0);
        assert!(doc.markup.ends_with("=\n"));
    }

    #[test]
    fn test_blank_address_is_omitted() {
        let mut order = session(vec![]);
        order.restaurant_address = Some("  ".to_string());
        let doc = renderer().render(&order, &printer(PaperSize::Mm58), false);
        let header: Vec<&str> = doc.markup.lines().take(3).collect();
        assert_eq!(header, ["{width:auto; text:wrap}", "|\"Quán Ngon|", "-"]);
    }

    #[test]
    fn test_width_profile_follows_paper_size() {
        let order = session(vec![dish("Phở bò", "food", 50000)]);

        let narrow = renderer().render(&order, &printer(PaperSize::Mm58), false);
        assert_eq!(narrow.cpl, 32);
        assert!(narrow.markup.contains("{border:space; width:16,16; text:wrap}"));
        assert!(narrow.markup.contains("{border:space; width:18,2,12; text:wrap}"));

        let wide = renderer().render(&order, &printer(PaperSize::Mm80), false);
        assert_eq!(wide.cpl, 48);
        assert!(wide.markup.contains("{border:space; width:25,23; text:wrap}"));
        assert!(wide.markup.contains("{border:space; width:33,2,12; text:wrap}"));
        assert!(wide.markup.contains("{border:space; width:20,28; text:wrap}"));
    }

    #[test]
    fn test_items_outside_allow_list_are_skipped() {
        let order = session(vec![
            dish("Phở bò", "food", 50000),
            dish("Bia Sài Gòn", "drink", 20000),
        ]);
        let doc = renderer().render(&order, &printer(PaperSize::Mm80), false);

        assert!(doc.markup.contains("|Phở bò |\"2| \"50.000|"));
        assert!(!doc.markup.contains("Bia Sài Gòn"));
        assert_eq!(item_rows(&doc.markup), 1);
    }

    #[test]
    fn test_empty_allow_list_prints_no_items() {
        let order = session(vec![dish("Phở bò", "food", 50000)]);
        let mut profile = printer(PaperSize::Mm80);
        profile.dish_types.clear();
        let doc = renderer().render(&order, &profile, false);
        assert_eq!(item_rows(&doc.markup), 0);
    }

    #[test]
    fn test_totals_shown_for_first_print() {
        let doc = renderer().render(&session(vec![]), &printer(PaperSize::Mm80), false);
        assert!(doc.markup.contains("|Tổng | 100.000|"));
        assert!(doc.markup.contains("|VAT | 10.000|"));
        assert!(doc.markup.contains("|\"Tổng tiền | \"110.000|"));
        assert!(!doc.markup.contains("Tiền khách đưa"));
    }

    #[test]
    fn test_totals_hidden_for_reprint_preview_or_no_price() {
        let mut reprint = session(vec![]);
        reprint.order_detail_number = Some(2);
        let doc = renderer().render(&reprint, &printer(PaperSize::Mm80), false);
        assert!(!doc.markup.contains("Tổng tiền"));

        let doc = renderer().render(&session(vec![]), &printer(PaperSize::Mm80), true);
        assert!(!doc.markup.contains("Tổng tiền"));

        let mut no_price = printer(PaperSize::Mm80);
        no_price.do_not_include_price_in_bill = true;
        let doc = renderer().render(&session(vec![dish("Phở bò", "food", 50000)]), &no_price, false);
        assert!(!doc.markup.contains("Tổng tiền"));
        assert!(doc.markup.contains("|Phở bò |\"2| \"|"));
    }

    #[test]
    fn test_vat_line_only_when_taxed() {
        let mut order = session(vec![]);
        order.tax_payment_amount = Decimal::ZERO;
        let doc = renderer().render(&order, &printer(PaperSize::Mm80), false);
        assert!(!doc.markup.contains("VAT"));
        assert!(doc.markup.contains("Tổng tiền"));
    }

    #[test]
    fn test_paid_and_change_lines() {
        let mut order = session(vec![
            dish("Phở bò", "food", 50000),
            dish("Bia Sài Gòn", "drink", 20000),
        ]);
        order.customer_paid_amount = Decimal::from(200000);
        order.return_amount = Decimal::from(90000);
        let doc = renderer().render(&order, &printer(PaperSize::Mm58), false);

        assert_eq!(item_rows(&doc.markup), 1);
        assert!(doc.markup.contains("|\"Tổng tiền | \"110.000|"));
        assert!(doc.markup.contains("|Tiền khách đưa | 200.000|"));
        assert!(doc.markup.contains("|Trả lại | 90.000|"));
    }

    #[test]
    fn test_note_printed_and_escaped() {
        let mut with_note = dish("Cơm \"đặc biệt\"", "food", 45000);
        with_note.note = Some("ít cay | không hành".to_string());
        let order = session(vec![with_note]);

        let hidden = renderer().render(&order, &printer(PaperSize::Mm80), false);
        assert!(!hidden.markup.contains("ít cay"));

        let mut profile = printer(PaperSize::Mm80);
        profile.include_note_in_bill = true;
        let doc = renderer().render(&order, &profile, false);
        assert!(doc.markup.contains("|Cơm \\\"đặc biệt\\\" |\"2| \"45.000|"));
        assert!(doc.markup.contains("{width:auto; text:wrap}\n|~~ít cay \\| không hành |\n\n{border:space; width:33,2,12; text:wrap}\n"));
    }

    #[test]
    fn test_reprint_marker() {
        let mut order = session(vec![]);
        order.order_detail_number = Some(3);

        let doc = renderer().render(&order, &printer(PaperSize::Mm80), false);
        assert!(!doc.markup.contains("Lần"));

        let mut profile = printer(PaperSize::Mm80);
        profile.include_order_detail_number = true;
        let doc = renderer().render(&order, &profile, false);
        assert!(doc.markup.ends_with(
            "{width:auto; border:line; align:center}\n|\"Lần 3|\n=\n"
        ));

        let doc = renderer().render(&session(vec![]), &profile, false);
        assert!(!doc.markup.contains("Lần"));
    }

    #[test]
    fn test_logo_always_embedded() {
        let doc = renderer().render(&session(vec![]), &printer(PaperSize::Mm58), true);
        assert!(doc.markup.contains(&format!("{{image:{}}}\n", logo_base64())));
    }

    #[test]
    fn test_render_is_deterministic() {
        let order = session(vec![dish("Phở bò", "food", 50000)]);
        let profile = printer(PaperSize::Mm58);
        let first = renderer().render(&order, &profile, false);
        let second = renderer().render(&order, &profile, false);
        assert_eq!(first, second);
    }

    #[test]
    fn test_unparsable_time_is_printed_as_is() {
        let mut order = session(vec![]);
        order.created_at = "hôm qua".to_string();
        let doc = renderer().render(&order, &printer(PaperSize::Mm80), false);
        assert!(doc.markup.contains("|\"Lan | hôm qua|"));
    }
}
