//! Winery reports
//!
//! Fixed aggregate queries over the winery schema and how each one is
//! presented. Table headers are positional: each header list matches the
//! column order of its query.

use std::io::Write;

use crate::chart::{BarChart, ChartSink, TickAnchor};
use crate::engine::{QueryExecutor, ResultSet};
use crate::error::Result;
use crate::report::{announce_chart, print_query_table};
use crate::series::{aggregate, aggregate_nested};

pub const INVENTORY_HEADERS: [&str; 5] =
    ["Wine ID", "Wine Type", "Current Stock", "Total Sold", "Remaining Stock"];

pub const INVENTORY_SQL: &str = "
    SELECT
        w.wine_id,
        wt.wine_type_name,
        w.inventory_quantity AS current_stock,
        SUM(s.quantity) AS total_sold,
        (w.inventory_quantity - IFNULL(SUM(s.quantity), 0)) AS remaining_stock
    FROM wines w
    LEFT JOIN sales s ON w.wine_id = s.wine_id
    LEFT JOIN wine_type wt ON w.wine_type_id = wt.wine_type_id
    GROUP BY w.wine_id
    ORDER BY w.wine_id";

pub const SUPPLIER_HEADERS: [&str; 5] =
    ["Ordered Date", "Supplier Name", "Expected Date", "Delivered Date", "Total Delay Days"];

pub const SUPPLIER_SQL: &str = "
    SELECT
        DATE_FORMAT(s.order_date, '%m-%d-%Y') AS order_month,
        sup.supplier_name,
        ANY_VALUE(DATE_FORMAT(s.expected_date, '%m-%d-%Y')) AS expected_date,
        ANY_VALUE(DATE_FORMAT(s.delivery_date, '%m-%d-%Y')) AS delivery_date,
        SUM(DATEDIFF(s.delivery_date, s.expected_date)) AS total_delay_days
    FROM supply s
    JOIN supplier sup ON s.supplier_id = sup.supplier_id
    GROUP BY order_month, sup.supplier_name
    ORDER BY DATE_FORMAT(MIN(s.order_date), '%Y-%m') ASC, total_delay_days DESC";

/// `(month, supplier, total delay days)`
pub const SUPPLIER_TREND_SQL: &str = "
    SELECT
        DATE_FORMAT(s.order_date, '%Y-%m') AS order_month,
        sup.supplier_name,
        SUM(DATEDIFF(s.delivery_date, s.expected_date)) AS total_delay_days
    FROM supply s
    JOIN supplier sup ON s.supplier_id = sup.supplier_id
    GROUP BY order_month, sup.supplier_name
    ORDER BY order_month ASC";

pub const WINE_SALES_HEADERS: [&str; 5] =
    ["Sale Date", "Sale ID", "Quantity", "Wine Type", "Distributor Name"];

pub const WINE_SALES_SQL: &str = "
    SELECT
        DATE_FORMAT(s.sale_date, '%m-%d-%Y') AS sale_date,
        s.sale_id,
        s.quantity,
        wt.wine_type_name,
        d.distributor_name
    FROM sales s
    JOIN wines w ON s.wine_id = w.wine_id
    JOIN wine_type wt ON w.wine_type_id = wt.wine_type_id
    JOIN distributor d ON s.distributor_id = d.distributor_id
    ORDER BY s.sale_date ASC, s.sale_id ASC, d.distributor_name ASC";

pub const DISTRIBUTOR_HEADERS: [&str; 4] =
    ["Distributor Name", "Wine Type", "Total Quantity Sold", "Total Sales"];

pub const DISTRIBUTOR_SQL: &str = "
    SELECT
        d.distributor_name,
        wt.wine_type_name,
        SUM(s.quantity) AS total_quantity_sold,
        COUNT(s.sale_id) AS total_sales
    FROM sales s
    JOIN wines w ON s.wine_id = w.wine_id
    JOIN wine_type wt ON w.wine_type_id = wt.wine_type_id
    JOIN distributor d ON s.distributor_id = d.distributor_id
    GROUP BY d.distributor_name, wt.wine_type_name
    ORDER BY d.distributor_name ASC, wt.wine_type_name ASC";

/// `(month, distributor, wine type, total quantity)`
pub const SALES_TREND_SQL: &str = "
    SELECT
        DATE_FORMAT(s.sale_date, '%m-%Y') AS sale_month,
        d.distributor_name,
        wt.wine_type_name,
        SUM(s.quantity) AS total_quantity
    FROM sales s
    JOIN wines w ON s.wine_id = w.wine_id
    JOIN wine_type wt ON w.wine_type_id = wt.wine_type_id
    JOIN distributor d ON s.distributor_id = d.distributor_id
    GROUP BY sale_month, d.distributor_name, wt.wine_type_name
    ORDER BY DATE_FORMAT(MIN(s.sale_date), '%Y-%m') ASC, d.distributor_name ASC, wt.wine_type_name ASC";

pub const EMPLOYEE_HEADERS: [&str; 6] = ["First Name", "Last Name", "Q1", "Q2", "Q3", "Q4"];

/// Quarterly totals, leaving out the quarter still in progress
pub const EMPLOYEE_SQL: &str = "
    SELECT
        e.first_name,
        e.last_name,
        SUM(CASE WHEN QUARTER(wh.work_date) = 1 THEN wh.hours_worked ELSE 0 END) AS Q1_total,
        SUM(CASE WHEN QUARTER(wh.work_date) = 2 THEN wh.hours_worked ELSE 0 END) AS Q2_total,
        SUM(CASE WHEN QUARTER(wh.work_date) = 3 THEN wh.hours_worked ELSE 0 END) AS Q3_total,
        SUM(CASE WHEN QUARTER(wh.work_date) = 4 THEN wh.hours_worked ELSE 0 END) AS Q4_total
    FROM employee e
    JOIN work_hours wh ON e.employee_id = wh.employee_id
    WHERE NOT (YEAR(wh.work_date) = YEAR(CURDATE())
        AND QUARTER(wh.work_date) = QUARTER(CURDATE()))
    GROUP BY e.employee_id
    ORDER BY e.employee_id ASC";

/// `(department, average hours per employee)`
pub const DEPARTMENT_HOURS_SQL: &str = "
    SELECT
        d.department_name,
        AVG(emp_hours.total_hours) AS avg_hours_per_dept
    FROM (
        SELECT e.employee_id, e.department_id, SUM(wh.hours_worked) AS total_hours
        FROM employee e
        JOIN work_hours wh ON e.employee_id = wh.employee_id
        WHERE NOT (YEAR(wh.work_date) = YEAR(CURDATE())
            AND QUARTER(wh.work_date) = QUARTER(CURDATE()))
        GROUP BY e.employee_id, e.department_id
    ) AS emp_hours
    JOIN department d ON emp_hours.department_id = d.department_id
    GROUP BY d.department_id
    ORDER BY d.department_name ASC";

pub const SUPPLIER_CHART_TITLE: &str = "Monthly Supplier Delivery Delays";
pub const SALES_CHART_TITLE: &str = "Monthly Wine Sales by Distributor and Wine Type";
pub const DEPARTMENT_CHART_TITLE: &str = "Average Hours Worked by Department";

/// Label of the single department series
pub const DEPARTMENT_SERIES: &str = "Avg Hours per Dept";

/// Joins distributor and wine type in flattened series labels
pub const SERIES_LABEL_SEPARATOR: &str = " - ";

/// Wine stock levels
pub async fn inventory_report<E: QueryExecutor, W: Write>(executor: &mut E, out: &mut W) -> Result<()> {
    print_query_table(executor, out, &INVENTORY_HEADERS, INVENTORY_SQL).await
}

/// Supplier delivery performance plus the monthly delay chart
pub async fn supplier_report<E, W, S>(executor: &mut E, out: &mut W, charts: &mut S) -> Result<()>
where
    E: QueryExecutor,
    W: Write,
    S: ChartSink + ?Sized,
{
    print_query_table(executor, out, &SUPPLIER_HEADERS, SUPPLIER_SQL).await?;

    let trend = executor.fetch_all(SUPPLIER_TREND_SQL).await?;
    let data = aggregate(triples(&trend)?);

    let chart = BarChart::grouped(SUPPLIER_CHART_TITLE, "Month", "Total Delay Days", data)
        .with_legend_title("Suppliers");
    announce_chart(out, charts.present(&chart)?)
}

/// Individual sales, totals by distributor, and the monthly sales chart
pub async fn wine_report<E, W, S>(executor: &mut E, out: &mut W, charts: &mut S) -> Result<()>
where
    E: QueryExecutor,
    W: Write,
    S: ChartSink + ?Sized,
{
    print_query_table(executor, out, &WINE_SALES_HEADERS, WINE_SALES_SQL).await?;

    writeln!(out, "\n- Report By Distributor-\n")?;
    print_query_table(executor, out, &DISTRIBUTOR_HEADERS, DISTRIBUTOR_SQL).await?;

    let trend = executor.fetch_all(SALES_TREND_SQL).await?;
    let rows = trend
        .rows
        .iter()
        .map(|row| Ok((row.text(0)?, row.text(1)?, row.text(2)?, row.number(3)?)))
        .collect::<Result<Vec<_>>>()?;
    let nested = aggregate_nested(rows);
    let distributors = nested.groups.len();
    let data = nested.flatten(SERIES_LABEL_SEPARATOR);

    // Ticks centre on the distributor clusters, not on every flattened series
    let chart = BarChart::grouped(SALES_CHART_TITLE, "Month", "Total Wines Sold", data)
        .with_legend_title("Distributors - Wine Type")
        .with_tick_groups(distributors);
    announce_chart(out, charts.present(&chart)?)
}

/// Quarterly hours per employee plus the department average chart
pub async fn employee_report<E, W, S>(executor: &mut E, out: &mut W, charts: &mut S) -> Result<()>
where
    E: QueryExecutor,
    W: Write,
    S: ChartSink + ?Sized,
{
    print_query_table(executor, out, &EMPLOYEE_HEADERS, EMPLOYEE_SQL).await?;

    let departments = executor.fetch_all(DEPARTMENT_HOURS_SQL).await?;
    let rows = departments
        .rows
        .iter()
        .map(|row| Ok((row.text(0)?, DEPARTMENT_SERIES, row.number(1)?)))
        .collect::<Result<Vec<_>>>()?;
    let data = aggregate(rows);

    let chart = BarChart::grouped(DEPARTMENT_CHART_TITLE, "Department", "Average Hours Worked", data)
        .with_bar_width(0.4)
        .with_tick_anchor(TickAnchor::Base)
        .with_value_labels();
    announce_chart(out, charts.present(&chart)?)
}

fn triples(result: &ResultSet) -> Result<Vec<(String, String, f64)>> {
    result
        .rows
        .iter()
        .map(|row| Ok((row.text(0)?, row.text(1)?, row.number(2)?)))
        .collect()
}
