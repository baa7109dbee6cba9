use std::{env, error::Error, io};

use jsonpath_engine::{Query, Value};

/// Evaluate the query given as the first argument against a JSON document
/// read from stdin, printing one `path => value` line per match.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let expr = env::args()
        .nth(1)
        .ok_or("usage: jsonpath-engine QUERY < DOCUMENT")?;

    let query = Query::standard(&expr)?;
    let data: serde_json::Value = serde_json::from_reader(io::stdin().lock())?;
    let value = Value::from(data);

    for node in query.find(&value)? {
        println!("{} => {}", node.path(), node.value);
    }

    Ok(())
}
