//! HTML pages. Every value that came from a request or the database goes
//! through [`escape`] before it is written into markup.

use std::fmt::Write;

use axum::response::Html;
use time::format_description::well_known::Rfc3339;

use crate::reservations::{
    dto::{DashboardSummary, ReservationForm},
    repo_types::Reservation,
};
use crate::seating::grid::{COLUMNS, ROWS};
use crate::seating::pricing::PRICE_BY_COLUMN;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
<nav><a href="/">Home</a> | <a href="/reserve">Reserve a seat</a> | <a href="/admin_login">Admin</a></nav>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape(title),
    ))
}

fn error_block(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default()
}

fn reservation_fields(form: &ReservationForm) -> String {
    format!(
        r#"<label>Passenger Name <input name="passenger_name" value="{name}" required maxlength="160"></label>
<label>Row (1-12) <input name="seat_row" type="number" min="1" max="12" value="{row}" required></label>
<label>Column (1-4) <input name="seat_col" type="number" min="1" max="4" value="{col}" required></label>"#,
        name = escape(&form.passenger_name),
        row = escape(&form.seat_row),
        col = escape(&form.seat_col),
    )
}

pub fn index_page() -> Html<String> {
    layout(
        "Seat Reservations",
        r#"<h1>Seat Reservations</h1>
<p>Pick any free seat on our 12-row cabin and get your e-ticket right away.</p>
<p><a href="/reserve">Reserve a seat</a></p>"#,
    )
}

pub fn login_page(username: &str, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<h1>Admin Login</h1>
{error}
<form method="post" action="/admin_login">
<label>Username <input name="username" value="{username}" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Login</button>
</form>"#,
        error = error_block(error),
        username = escape(username),
    );
    layout("Admin Login", &body)
}

pub fn reserve_page(
    form: &ReservationForm,
    error: Option<&str>,
    reservation: Option<&Reservation>,
) -> Html<String> {
    let confirmation = reservation
        .map(|r| {
            format!(
                r#"<section class="confirmation">
<p>Congratulations {name}! Row {row}, seat {col} is now reserved for you.</p>
<p>Your e-ticket number is <strong class="ticket">{ticket}</strong></p>
</section>"#,
                name = escape(&r.passenger_name),
                row = r.seat_row,
                col = r.seat_column,
                ticket = escape(&r.ticket_number),
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Reserve Your Seat</h1>
{confirmation}
{error}
<form method="post" action="/reserve">
{fields}
<button type="submit">Reserve Seat</button>
</form>"#,
        error = error_block(error),
        fields = reservation_fields(form),
    );
    layout("Reserve a Seat", &body)
}

pub fn dashboard_page(summary: &DashboardSummary, notice: Option<&str>) -> Html<String> {
    let mut chart = String::from("<table class=\"chart\">\n<tr><th>Row</th>");
    for (i, price) in PRICE_BY_COLUMN.iter().enumerate() {
        let _ = write!(chart, "<th>{} (${price})</th>", i + 1);
    }
    chart.push_str("</tr>\n");
    for (i, row) in summary.grid.rows().enumerate() {
        let _ = write!(chart, "<tr><td>{}</td>", i + 1);
        for cell in row {
            let _ = write!(chart, "<td>{}</td>", cell.marker());
        }
        chart.push_str("</tr>\n");
    }
    chart.push_str("</table>");

    let mut list = String::new();
    if summary.reservations.is_empty() {
        list.push_str("<p>No reservations yet.</p>");
    } else {
        list.push_str(
            "<table class=\"reservations\">\n<tr><th>Name</th><th>Row</th><th>Column</th><th>E-Ticket</th><th>Created</th><th></th></tr>\n",
        );
        for r in &summary.reservations {
            let created = r.created_at.format(&Rfc3339).unwrap_or_default();
            let _ = write!(
                list,
                "<tr><td>{name}</td><td>{row}</td><td>{col}</td><td>{ticket}</td><td>{created}</td><td><a href=\"/edit/{id}\">Edit</a></td></tr>\n",
                name = escape(&r.passenger_name),
                row = r.seat_row,
                col = r.seat_column,
                ticket = escape(&r.ticket_number),
                id = r.id,
            );
        }
        list.push_str("</table>");
    }

    let notice = notice
        .map(|n| format!(r#"<p class="notice">{}</p>"#, escape(n)))
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Administrator Dashboard</h1>
<form method="post" action="/admin_logout"><button type="submit">Log out</button></form>
{notice}
<h2>Seating Chart</h2>
<p>X = reserved, _ = available</p>
{chart}
<p>Seats sold: {sold} of {capacity}</p>
<p>Total revenue: <strong class="revenue">${revenue}</strong></p>
<h2>Reservations</h2>
{list}
<h2>Delete a Reservation</h2>
<form method="post" action="/admin_dashboard">
<label>E-Ticket Number <input name="eTicketNumber" required></label>
<button type="submit">Delete</button>
</form>"#,
        sold = summary.grid.occupied_count(),
        capacity = ROWS * COLUMNS,
        revenue = summary.total_revenue,
    );
    layout("Administrator Dashboard", &body)
}

pub fn edit_page(id: i64, form: &ReservationForm, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<h1>Edit Reservation #{id}</h1>
{error}
<form method="post" action="/edit/{id}">
{fields}
<button type="submit">Save</button>
</form>
<p><a href="/admin_dashboard">Back to dashboard</a></p>"#,
        error = error_block(error),
        fields = reservation_fields(form),
    );
    layout("Edit Reservation", &body)
}

pub fn message_page(title: &str, message: &str) -> Html<String> {
    let body = format!("<h1>{}</h1>\n<p>{}</p>", escape(title), escape(message));
    layout(title, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seating::compute_grid;
    use time::OffsetDateTime;

    fn reservation(name: &str) -> Reservation {
        Reservation {
            id: 7,
            passenger_name: name.into(),
            seat_row: 2,
            seat_column: 3,
            ticket_number: "0123456789abcdef0123456789abcdef".into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
    }

    #[test]
    fn reserve_page_shows_ticket_and_escapes_name() {
        let r = reservation("<b>Mallory</b>");
        let Html(html) = reserve_page(&ReservationForm::default(), None, Some(&r));
        assert!(html.contains("0123456789abcdef0123456789abcdef"));
        assert!(html.contains("&lt;b&gt;Mallory&lt;/b&gt;"));
        assert!(!html.contains("<b>Mallory"));
    }

    #[test]
    fn dashboard_renders_chart_and_revenue() {
        let reservations = vec![reservation("Alice")];
        let summary = DashboardSummary {
            grid: compute_grid(&reservations),
            total_revenue: 50,
            reservations,
        };
        let Html(html) = dashboard_page(&summary, Some("done"));
        assert!(html.contains("<td>X</td>"));
        assert!(html.contains("$50"));
        assert!(html.contains("/edit/7"));
        assert!(html.contains("done"));
        assert!(html.contains("Seats sold: 1 of 48"));
        assert_eq!(html.matches("<td>X</td>").count(), 1);
        assert_eq!(html.matches("<td>_</td>").count(), 47);
    }

    #[test]
    fn edit_page_prefills_form() {
        let r = reservation("Alice");
        let Html(html) = edit_page(r.id, &ReservationForm::from(&r), Some("This seat is already reserved."));
        assert!(html.contains(r#"value="Alice""#));
        assert!(html.contains(r#"name="seat_row" type="number" min="1" max="12" value="2""#));
        assert!(html.contains("This seat is already reserved."));
    }
}
