use registrar_core::driver::mysql::MySqlDriver;
use registrar_core::{BuildOptions, Config, ConnectOptions, Registry, SortDirection, StatementKind, TagPolicy};
use std::time::Duration;

#[tokio::main]
async fn main() -> registrar_core::Result<()> {
    let host = std::env::var("MYSQL_HOST").unwrap_or_else(|_| "127.0.0.1:3306".to_string());
    let user = std::env::var("MYSQL_USER").unwrap_or_else(|_| "root".to_string());
    let password = std::env::var("MYSQL_PASSWORD").unwrap_or_else(|_| "secret".to_string());

    let driver = MySqlDriver::new().with_connect_timeout(Duration::from_secs(5));
    let registry = Registry::with_config(driver, Config::default().with_allowed_tags("<b>"));

    let conn = registry
        .connect(ConnectOptions::new(host, user, password, "shop").with_fields(["id", "name"]))
        .await?;
    println!("connected as '{}'", conn);

    // SELECT using the connection's default database and fields
    let name = registry.clean(&conn, "<i>O'Brien</i>", TagPolicy::Strip)?;
    println!("cleaned input: {}", name);

    let select = BuildOptions::new("customers")
        .equal("status", "active")
        .not_equal("country", "XX")
        .order_by("id", SortDirection::Desc)
        .limit(10);
    let statement = registry.build_and_store(StatementKind::Select, &select, &conn, "active_customers")?;
    println!("SELECT SQL: {}", statement);

    // INSERT with explicit fields
    let insert = BuildOptions::new("customers")
        .fields(["name", "country"])
        .values(["O'Brien", "IE"]);
    println!("INSERT SQL: {}", registry.build(StatementKind::Insert, &insert, &conn)?);

    // The same options in their JSON form
    let from_json = BuildOptions::from_json_str(
        r#"{"table": "customers", "equal": {"id": 42}, "order_by": {"name": "ASC"}}"#,
    )?;
    println!("JSON SQL: {}", registry.build(StatementKind::Select, &from_json, &conn)?);

    println!(
        "cached: {:?}",
        registry.named_query(&conn, "active_customers")?
    );

    registry.close_all().await
}
