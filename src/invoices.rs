use chrono::NaiveDate;

use crate::billing::{Money, Totals};
use crate::config::Config;
use crate::template::{self, Missing, Params, TemplateError};
use crate::templates::{self, escape_tex, Markup};

pub const TEXT_LAYOUT: &str = include_str!("../layouts/invoice.txt");
pub const TEX_LAYOUT: &str = include_str!("../layouts/invoice.tex");

/// Everything needed to fill in an invoice layout.
#[derive(Debug, Clone)]
pub struct Invoice<'a> {
    pub config: &'a Config,
    pub recipient: &'a str,
    pub date: NaiveDate,
    pub totals: &'a Totals,
}

pub fn layout(markup: Markup) -> &'static str {
    match markup {
        Markup::Text => TEXT_LAYOUT,
        Markup::Tex => TEX_LAYOUT,
    }
}

fn multiline(s: &str, markup: Markup) -> String {
    match markup {
        Markup::Text => s.to_string(),
        Markup::Tex => s
            .lines()
            .map(escape_tex)
            .collect::<Vec<_>>()
            .join("\\\\\n"),
    }
}

impl<'a> Invoice<'a> {
    pub fn new(
        config: &'a Config,
        recipient: &'a str,
        date: NaiveDate,
        totals: &'a Totals,
    ) -> Self {
        Self {
            config,
            recipient,
            date,
            totals,
        }
    }

    pub fn params(&self, markup: Markup) -> Result<Params, TemplateError> {
        let currency = self.config.currency.as_str();
        let rates: Vec<String> = self
            .totals
            .rates
            .iter()
            .map(|r| Money::new(*r).display(currency).to_string())
            .collect();

        let plain = [
            ("id", self.config.invoice_number()),
            ("date", self.date.to_string()),
            ("name", self.config.name.clone()),
            ("email", self.config.email.clone()),
            ("currency", self.config.currency.clone()),
            ("hours", self.totals.total_hours.normalize().to_string()),
            ("rates", rates.join(", ")),
            (
                "total",
                self.totals.total_amount.display(currency).to_string(),
            ),
        ];

        let mut params: Params = plain
            .into_iter()
            .map(|(key, value)| {
                let value = match markup {
                    Markup::Text => value,
                    Markup::Tex => escape_tex(&value),
                };
                (key.to_string(), value)
            })
            .collect();

        params.insert(
            "address".to_string(),
            multiline(&self.config.address, markup),
        );
        params.insert(
            "recipient".to_string(),
            multiline(self.recipient, markup),
        );
        params.insert(
            "items".to_string(),
            templates::items(self.totals, currency, markup)?,
        );
        params.insert(
            "totals".to_string(),
            templates::totals(self.totals, currency, markup)?,
        );
        Ok(params)
    }

    pub fn render(
        &self,
        layout: &str,
        markup: Markup,
        missing: Missing,
    ) -> Result<String, TemplateError> {
        template::render(layout, &self.params(markup)?, missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expenses;

    fn config() -> Config {
        Config {
            id: 7,
            ..Config::new(
                "Ada_Lovelace".to_string(),
                "1 Main St\nSpringfield".to_string(),
                "ada@example.com".to_string(),
                "$".to_string(),
            )
        }
    }

    fn totals() -> Totals {
        let entries = expenses::from_str(
            r#"[{"rate": 50, "hours": [
                {"date": "2020-01-01", "hours": 3},
                {"date": "2020-01-02", "hours": 5}
            ]}]"#,
        )
        .unwrap();
        Totals::calculate(&entries).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 2, 1).unwrap()
    }

    #[test]
    fn text_invoice() -> Result<(), TemplateError> {
        let config = config();
        let totals = totals();
        let invoice = Invoice::new(&config, "Bob\nElsewhere", date(), &totals);
        let text = invoice.render(TEXT_LAYOUT, Markup::Text, Missing::Fail)?;

        assert!(text.starts_with("INVOICE 00007\nDate: 2020-02-01\n"));
        assert!(text.contains("Ada_Lovelace\n1 Main St\nSpringfield\n"));
        assert!(text.contains("Bill to:\nBob\nElsewhere\n"));
        assert!(text.contains("$400.00"));
        assert!(!text.contains("${"));
        Ok(())
    }

    #[test]
    fn tex_invoice_is_escaped() -> Result<(), TemplateError> {
        let config = config();
        let totals = totals();
        let invoice = Invoice::new(&config, "Bob & Co", date(), &totals);
        let tex = invoice.render(TEX_LAYOUT, Markup::Tex, Missing::Fail)?;

        assert!(tex.contains(r"\textbf{Ada\_Lovelace}"));
        assert!(tex.contains("1 Main St\\\\\nSpringfield"));
        assert!(tex.contains(r"Bob \& Co"));
        assert!(tex.contains(r"Invoice \#00007"));
        assert!(tex.contains(r"\textbf{Total} & \$400.00 \\"));
        assert!(!tex.contains("${"));
        Ok(())
    }

    #[test]
    fn summary_params() -> Result<(), TemplateError> {
        let config = config();
        let totals = totals();
        let invoice = Invoice::new(&config, "Bob", date(), &totals);
        let layout = "${hours}h at ${rates} = ${total} (${currency}) ${custom}";

        let out = invoice.render(layout, Markup::Text, Missing::Empty)?;
        assert_eq!(out, "8h at $50.00 = $400.00 ($) ");

        let strict = invoice.render(layout, Markup::Text, Missing::Fail);
        assert!(matches!(strict, Err(TemplateError::MissingKey { .. })));
        Ok(())
    }
}
