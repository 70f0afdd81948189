use optree_core::{catalog, Marshaller};

fn main() {
    let literal = r#"
        const options = {
            chart: { type: 'line', margin: 12 },
            title: { text: 'Monthly Average Temperature', useHTML: true },
            tooltip: {
                formatter: function () {
                    return '<b>' + this.x + '</b>: ' + this.y + '°C';
                }
            },
            series: [{ type: 'line', name: 'Tokyo', data: [7.0, 6.9, 9.5, 14.5] }]
        };
    "#;

    let marshaller = Marshaller::new(catalog::builtin());
    match marshaller.from_literal("Options", literal) {
        Ok(options) => {
            println!("Normalized literal:\n{}", marshaller.to_literal(&options));
            match marshaller.to_json(&options) {
                Ok(json) => println!("JSON:\n{json}"),
                Err(e) => println!("Not representable as JSON: {e}"),
            }
        }
        Err(e) => {
            eprintln!("Failed to read options: {:?}", miette::Report::new(e));
        }
    }
}
