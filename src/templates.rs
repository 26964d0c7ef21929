// Message template registry and variable substitution
//
// Templates are static (subject, HTML body) pairs with {{variable}}
// placeholders. Rendering substitutes the fixed variable set literally;
// anything left unresolved is scrubbed to an empty string so no raw
// placeholder ever reaches a customer inbox.

use regex::Regex;
use std::sync::OnceLock;

use crate::config::LinkConfig;
use crate::models::Lead;

pub const WELCOME_NEW_LEAD: &str = "welcome-new-lead";
pub const CONTACT_FOLLOW_UP: &str = "contact-follow-up";
pub const QUALIFICATION_REMINDER: &str = "qualification-reminder";
pub const NEGOTIATION_PUSH: &str = "negotiation-push";
pub const REACTIVATION_OFFER: &str = "reactivation-offer";

#[derive(Debug, Clone, Copy)]
pub struct MessageTemplate {
    pub id: &'static str,
    pub subject: &'static str,
    pub html_body: &'static str,
}

#[derive(Debug, Clone)]
pub struct RenderedMessage {
    pub subject: String,
    pub html_body: String,
}

/// The fixed variable set available to every template. Fields without a
/// source render as empty strings.
#[derive(Debug, Clone, Default)]
pub struct TemplateVars {
    pub customer_name: String,
    pub agent_name: String,
    pub agent_email: String,
    pub agent_phone: String,
    pub property_title: String,
    pub property_location: String,
    pub property_price: String,
    pub property_type: String,
    pub property_bedrooms: String,
    pub property_bathrooms: String,
    pub website_url: String,
    pub calendar_link: String,
    pub property_link: String,
    pub similar_properties_link: String,
    pub new_properties_link: String,
    pub new_properties_count: String,
}

impl TemplateVars {
    /// Build the variable set for one lead from its snapshot plus the
    /// static marketplace links.
    pub fn for_lead(lead: &Lead, links: &LinkConfig) -> Self {
        let mut vars = TemplateVars {
            customer_name: lead.name.clone(),
            agent_name: lead.agent.name.clone(),
            agent_email: lead.agent.email.clone(),
            agent_phone: lead.agent.phone.clone().unwrap_or_default(),
            website_url: links.website_url.clone(),
            calendar_link: links.calendar_link.clone(),
            similar_properties_link: links.similar_properties_link.clone(),
            new_properties_link: links.new_properties_link.clone(),
            new_properties_count: links.new_properties_count.clone(),
            ..Default::default()
        };

        if let Some(property) = &lead.property {
            vars.property_title = property.title.clone();
            vars.property_location = property.location.clone();
            vars.property_price = property.price.to_string();
            vars.property_type = property.property_type.to_string();
            vars.property_bedrooms = property.bedrooms.to_string();
            vars.property_bathrooms = property.bathrooms.to_string();
            vars.property_link = format!("{}/properties/{}", links.website_url, property.id);
        }

        vars
    }

    fn pairs(&self) -> [(&'static str, &str); 16] {
        [
            ("customer_name", &self.customer_name),
            ("agent_name", &self.agent_name),
            ("agent_email", &self.agent_email),
            ("agent_phone", &self.agent_phone),
            ("property_title", &self.property_title),
            ("property_location", &self.property_location),
            ("property_price", &self.property_price),
            ("property_type", &self.property_type),
            ("property_bedrooms", &self.property_bedrooms),
            ("property_bathrooms", &self.property_bathrooms),
            ("website_url", &self.website_url),
            ("calendar_link", &self.calendar_link),
            ("property_link", &self.property_link),
            ("similar_properties_link", &self.similar_properties_link),
            ("new_properties_link", &self.new_properties_link),
            ("new_properties_count", &self.new_properties_count),
        ]
    }
}

/// Look up a template by name. Unknown names yield `None`; the executor
/// treats a missing template as a no-op rather than an error.
pub fn find_template(id: &str) -> Option<&'static MessageTemplate> {
    TEMPLATES.iter().find(|t| t.id == id)
}

/// Render a template by replacing every `{{name}}` occurrence with the
/// matching variable and scrubbing any leftover placeholders to "".
pub fn render(template: &MessageTemplate, vars: &TemplateVars) -> RenderedMessage {
    RenderedMessage {
        subject: substitute(template.subject, vars),
        html_body: substitute(template.html_body, vars),
    }
}

fn substitute(text: &str, vars: &TemplateVars) -> String {
    let mut out = text.to_string();
    for (name, value) in vars.pairs() {
        let token = format!("{{{{{}}}}}", name);
        if out.contains(&token) {
            out = out.replace(&token, value);
        }
    }
    leftover_pattern().replace_all(&out, "").into_owned()
}

fn leftover_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{[A-Za-z0-9_]+\}\}").unwrap())
}

static TEMPLATES: [MessageTemplate; 5] = [
    MessageTemplate {
        id: WELCOME_NEW_LEAD,
        subject: "Welcome! Your property search starts here",
        html_body: r#"
<html>
<head>
    <style>
        body { font-family: Arial, sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 0 auto; background: white; border-radius: 8px; overflow: hidden; }
        .header { background: #2563eb; color: white; padding: 20px; text-align: center; }
        .content { padding: 30px; }
        .property-card { background: #f8fafc; border-left: 4px solid #2563eb; padding: 15px; margin: 20px 0; }
        .btn { display: inline-block; background: #2563eb; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; margin: 10px 0; }
        .footer { background: #f8fafc; padding: 20px; text-align: center; color: #666; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Welcome aboard, {{customer_name}}!</h1>
        </div>
        <div class="content">
            <p>Hi {{customer_name}},</p>
            <p>Thanks for your inquiry. I'm {{agent_name}}, your dedicated agent, and I'll be
            helping you every step of the way.</p>
            <div class="property-card">
                <h3>{{property_title}}</h3>
                <p><strong>Location:</strong> {{property_location}}</p>
                <p><strong>Price:</strong> {{property_price}}</p>
                <p><strong>Bedrooms:</strong> {{property_bedrooms}} | <strong>Bathrooms:</strong> {{property_bathrooms}}</p>
            </div>
            <a href="{{property_link}}" class="btn">View the listing</a>
            <p>Prefer to talk it through? Book a call that suits you:</p>
            <a href="{{calendar_link}}" class="btn">Schedule a call</a>
            <p>Best regards,<br>{{agent_name}}<br>{{agent_email}} | {{agent_phone}}</p>
        </div>
        <div class="footer">
            <p><a href="{{website_url}}">Browse all listings</a></p>
        </div>
    </div>
</body>
</html>
"#,
    },
    MessageTemplate {
        id: CONTACT_FOLLOW_UP,
        subject: "Still thinking about {{property_title}}?",
        html_body: r#"
<html>
<head>
    <style>
        body { font-family: Arial, sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 0 auto; background: white; border-radius: 8px; overflow: hidden; }
        .content { padding: 30px; }
        .btn { display: inline-block; background: #2563eb; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; margin: 10px 0; }
    </style>
</head>
<body>
    <div class="container">
        <div class="content">
            <p>Hi {{customer_name}},</p>
            <p>Just checking in after your inquiry yesterday. {{property_title}} in
            {{property_location}} is still available, and I'd be happy to arrange a viewing
            or answer any questions.</p>
            <a href="{{property_link}}" class="btn">Revisit the listing</a>
            <p>If this one isn't quite right, here are similar properties you might like:</p>
            <a href="{{similar_properties_link}}" class="btn">See similar properties</a>
            <p>Talk soon,<br>{{agent_name}}<br>{{agent_email}} | {{agent_phone}}</p>
        </div>
    </div>
</body>
</html>
"#,
    },
    MessageTemplate {
        id: QUALIFICATION_REMINDER,
        subject: "Let's find your perfect match, {{customer_name}}",
        html_body: r#"
<html>
<head>
    <style>
        body { font-family: Arial, sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 0 auto; background: white; border-radius: 8px; overflow: hidden; }
        .content { padding: 30px; }
        .highlight { background: #fef3c7; border: 1px solid #f59e0b; padding: 15px; border-radius: 6px; margin: 20px 0; }
        .btn { display: inline-block; background: #2563eb; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; margin: 10px 0; }
    </style>
</head>
<body>
    <div class="container">
        <div class="content">
            <p>Hi {{customer_name}},</p>
            <p>It's been a few days since we last spoke. To narrow things down, it would help to
            know a bit more about your budget, preferred areas, and must-haves.</p>
            <div class="highlight">
                <p>{{new_properties_count}} new {{property_type}} listings went live since your
                last visit.</p>
            </div>
            <a href="{{new_properties_link}}" class="btn">Browse new listings</a>
            <p>Or grab a slot in my calendar and we'll go through them together:</p>
            <a href="{{calendar_link}}" class="btn">Book a chat</a>
            <p>Best,<br>{{agent_name}}</p>
        </div>
    </div>
</body>
</html>
"#,
    },
    MessageTemplate {
        id: NEGOTIATION_PUSH,
        subject: "Don't let {{property_title}} slip away",
        html_body: r#"
<html>
<head>
    <style>
        body { font-family: Arial, sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 0 auto; background: white; border-radius: 8px; overflow: hidden; }
        .content { padding: 30px; }
        .alert-box { background: #fef2f2; border-left: 4px solid #dc2626; padding: 15px; margin: 20px 0; }
        .btn { display: inline-block; background: #dc2626; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; margin: 10px 0; }
    </style>
</head>
<body>
    <div class="container">
        <div class="content">
            <p>Hi {{customer_name}},</p>
            <div class="alert-box">
                <p><strong>{{property_title}}</strong> at {{property_price}} is drawing interest
                from other buyers.</p>
            </div>
            <p>We were making good progress on your offer. If you're still interested, let's get
            the negotiation moving again before someone else steps in.</p>
            <a href="{{calendar_link}}" class="btn">Call me today</a>
            <p>{{agent_name}}<br>{{agent_email}} | {{agent_phone}}</p>
        </div>
    </div>
</body>
</html>
"#,
    },
    MessageTemplate {
        id: REACTIVATION_OFFER,
        subject: "We miss you, {{customer_name}} - the market has moved",
        html_body: r#"
<html>
<head>
    <style>
        body { font-family: Arial, sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; }
        .container { max-width: 600px; margin: 0 auto; background: white; border-radius: 8px; overflow: hidden; }
        .header { background: #059669; color: white; padding: 20px; text-align: center; }
        .content { padding: 30px; }
        .btn { display: inline-block; background: #059669; color: white; padding: 12px 24px; text-decoration: none; border-radius: 6px; margin: 10px 0; }
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>A lot has changed in a month</h1>
        </div>
        <div class="content">
            <p>Hi {{customer_name}},</p>
            <p>It's been a while since your search with us. New listings arrive every week, and
            prices in {{property_location}} have shifted since you last looked.</p>
            <a href="{{new_properties_link}}" class="btn">See what's new</a>
            <p>If your plans have changed, just reply and let me know - otherwise I'd love to
            pick up where we left off.</p>
            <p>{{agent_name}}<br>{{agent_email}}</p>
        </div>
    </div>
</body>
</html>
"#,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgentContact, LeadStage, PropertySnapshot, PropertyType};
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn sample_lead() -> Lead {
        Lead {
            id: "lead-1".to_string(),
            name: "Sarah".to_string(),
            email: "sarah@example.com".to_string(),
            phone: None,
            agent: AgentContact {
                id: "agent-1".to_string(),
                name: "Mark Davis".to_string(),
                email: "mark@homes.example".to_string(),
                phone: Some("+1 555 0100".to_string()),
            },
            stage: LeadStage::Lead,
            created_at: Utc::now(),
            last_contact: None,
            property: Some(PropertySnapshot {
                id: "prop-7".to_string(),
                title: "Sunny 2BR Apartment".to_string(),
                location: "Riverside".to_string(),
                price: Decimal::new(245_000, 0),
                property_type: PropertyType::Apartment,
                bedrooms: 2,
                bathrooms: 1,
            }),
        }
    }

    fn links() -> LinkConfig {
        LinkConfig {
            website_url: "https://homes.example".to_string(),
            calendar_link: "https://homes.example/book".to_string(),
            similar_properties_link: "https://homes.example/properties?similar=1".to_string(),
            new_properties_link: "https://homes.example/properties?sort=newest".to_string(),
            new_properties_count: "12".to_string(),
        }
    }

    #[test]
    fn test_welcome_template_substitutes_customer_name() {
        let template = find_template(WELCOME_NEW_LEAD).unwrap();
        let vars = TemplateVars::for_lead(&sample_lead(), &links());
        let rendered = render(template, &vars);

        assert!(!rendered.subject.contains("{{"));
        assert!(rendered.html_body.contains("Sarah"));
        assert!(!rendered.html_body.contains("{{customer_name}}"));
    }

    #[test]
    fn test_no_placeholder_survives_rendering() {
        let vars = TemplateVars::for_lead(&sample_lead(), &links());
        for template in &TEMPLATES {
            let rendered = render(template, &vars);
            assert!(!rendered.subject.contains("{{"), "subject of {}", template.id);
            assert!(!rendered.html_body.contains("{{"), "body of {}", template.id);
        }
    }

    #[test]
    fn test_missing_property_renders_empty_not_literal() {
        let mut lead = sample_lead();
        lead.property = None;
        let vars = TemplateVars::for_lead(&lead, &links());
        let rendered = render(find_template(CONTACT_FOLLOW_UP).unwrap(), &vars);

        assert!(!rendered.subject.contains("{{property_title}}"));
        assert!(!rendered.html_body.contains("{{"));
    }

    #[test]
    fn test_unknown_template_is_none() {
        assert!(find_template("no-such-template").is_none());
    }

    #[test]
    fn test_property_link_built_from_website_url() {
        let vars = TemplateVars::for_lead(&sample_lead(), &links());
        assert_eq!(vars.property_link, "https://homes.example/properties/prop-7");
    }
}
