use crate::cart::{find_product, Cart, CartError, CartStore, Customer, Order};
use crate::contact::{ContactForm, Delivery, EmailSender};
use crate::llm::{self, unavailable_message, Config, GeminiClient, StudyTools, TextGenerator};
use crate::reconcile::{Reconciled, Reconciler};
use crate::timetable::{layout, RevisionRequest, Timetable};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// Everything a command handler needs.
pub struct AppState<G: TextGenerator = GeminiClient> {
    pub tools: Option<StudyTools<G>>,
    pub reconciler: Reconciler,
    pub cart: CartStore,
    pub email: EmailSender,
    pub json: bool,
}

impl AppState<GeminiClient> {
    /// AI tools are left out when a required setting is missing; AI
    /// commands then answer with [`unavailable_message`].
    pub fn from_config(config: &Config, json: bool) -> Self {
        let tools = match llm::validate_environment(config) {
            Ok(()) => llm::study_tools(config)
                .map_err(|e| warn!(error = %e, "AI tools disabled"))
                .ok(),
            Err(missing) => {
                debug!(%missing, "AI tools disabled");
                None
            }
        };
        Self {
            tools,
            reconciler: Reconciler::new(config.reconciler.clone()),
            cart: CartStore::new(&config.cart.path),
            email: EmailSender::new(config.email.clone()),
            json,
        }
    }
}

impl<G: TextGenerator> AppState<G> {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce(&T) -> String) -> Result<String> {
        if self.json {
            serde_json::to_string_pretty(value).context("Failed to serialize output")
        } else {
            Ok(text(value))
        }
    }

    fn tools(&self) -> Result<&StudyTools<G>> {
        self.tools
            .as_ref()
            .ok_or_else(|| anyhow!(unavailable_message()))
    }

    /* ---------- AI TOOLS ---------- */

    pub fn reconcile(&self, raw_text: &str, problem: &str) -> Result<String> {
        let reconciled = self.reconciler.reconcile(raw_text, problem);
        self.emit(&reconciled, render_breakdown)
    }

    /// Saved model output may not be valid UTF-8; bad bytes become U+FFFD.
    pub fn reconcile_bytes(&self, raw: &[u8], problem: &str) -> Result<String> {
        self.reconcile(&String::from_utf8_lossy(raw), problem)
    }

    pub async fn breakdown(&self, problem: &str) -> Result<String> {
        let reconciled = self.tools()?.breakdown_problem(problem).await?;
        self.emit(&reconciled, render_breakdown)
    }

    pub async fn study_tip(&self, topic: &str) -> String {
        match &self.tools {
            Some(tools) => tools.study_tip(topic).await,
            None => unavailable_message().to_string(),
        }
    }

    pub async fn quote(&self) -> String {
        match &self.tools {
            Some(tools) => tools.motivational_quote().await,
            None => unavailable_message().to_string(),
        }
    }

    pub async fn timetable(&self, request_path: &Path) -> Result<String> {
        let content = std::fs::read_to_string(request_path)
            .with_context(|| format!("Failed to read {}", request_path.display()))?;
        let request: RevisionRequest = serde_json::from_str(&content)
            .with_context(|| format!("Invalid revision request in {}", request_path.display()))?;
        let timetable = self.tools()?.revision_timetable(&request).await?;
        self.emit(&timetable, render_timetable)
    }

    /* ---------- CART ---------- */

    fn with_cart(&self, change: impl FnOnce(&mut Cart) -> Result<(), CartError>) -> Result<String> {
        let mut cart = self.cart.load();
        change(&mut cart)?;
        self.cart.save(&cart)?;
        self.emit(&cart, render_cart)
    }

    pub fn cart_add(&self, product_id: &str) -> Result<String> {
        let product =
            find_product(product_id).ok_or_else(|| CartError::UnknownProduct(product_id.into()))?;
        self.with_cart(|cart| {
            cart.add(product);
            Ok(())
        })
    }

    pub fn cart_update(&self, product_id: &str, quantity: u32) -> Result<String> {
        self.with_cart(|cart| cart.update_quantity(product_id, quantity))
    }

    pub fn cart_remove(&self, product_id: &str) -> Result<String> {
        self.with_cart(|cart| {
            cart.remove(product_id)
                .map(|_| ())
                .ok_or_else(|| CartError::NotInCart(product_id.into()))
        })
    }

    pub fn cart_clear(&self) -> Result<String> {
        self.with_cart(|cart| {
            cart.clear();
            Ok(())
        })
    }

    pub fn cart_show(&self) -> Result<String> {
        self.emit(&self.cart.load(), render_cart)
    }

    pub fn checkout(&self, customer: Customer) -> Result<String> {
        let mut cart = self.cart.load();
        let order = cart.checkout(customer)?;
        self.cart.save(&cart)?;
        self.emit(&order, render_order)
    }

    /* ---------- CONTACT ---------- */

    pub async fn contact(&self, form: &ContactForm) -> Result<String> {
        Ok(match self.email.send(form).await? {
            Delivery::Sent => "Thank you for your message! We'll get back to you soon.".to_string(),
            Delivery::Logged => {
                "Message logged (development mode); EmailJS is not configured.".to_string()
            }
        })
    }
}

pub fn render_breakdown(reconciled: &Reconciled) -> String {
    let b = reconciled.breakdown();
    let mut out = String::new();
    if let Some(note) = reconciled.degraded_note() {
        out.push_str(&format!("Note: {}\n\n", note));
    }
    out.push_str(&format!("{}\n\nProblem: {}\n", b.title, b.problem));
    out.push_str("\nGiven:\n");
    for item in &b.given {
        out.push_str(&format!("  - {}\n", item));
    }
    out.push_str(&format!("\nFind: {}\n", b.find));
    out.push_str("\nPrinciples:\n");
    for item in &b.principles {
        out.push_str(&format!("  - {}\n", item));
    }
    out.push_str("\nSteps:\n");
    for step in &b.steps {
        out.push_str(&format!("  {}. {}\n", step.step, step.description));
        if !step.calculation.is_empty() {
            out.push_str(&format!("     {}\n", step.calculation));
        }
        if !step.result.is_empty() {
            out.push_str(&format!("     => {}\n", step.result));
        }
    }
    out.push_str(&format!("\nFinal answer: {}\n\nKey concept: {}\n", b.final_answer, b.concept));
    out
}

pub fn render_timetable(timetable: &Timetable) -> String {
    let mut out = format!("{}\n{}\n", timetable.title, timetable.summary);
    for week in &timetable.weekly_schedule {
        out.push('\n');
        out.push_str(&layout(week).render_text(16));
    }
    out
}

pub fn render_cart(cart: &Cart) -> String {
    if cart.is_empty() {
        return "Your cart is empty.\n".to_string();
    }
    let mut out = String::new();
    for item in cart.items() {
        let price = if item.product.is_free {
            "Free".to_string()
        } else {
            item.product.price_label.clone().unwrap_or_default()
        };
        out.push_str(&format!(
            "{:<8} {} (x{}) {}\n",
            item.product.id, item.product.name, item.quantity, price
        ));
    }
    out.push_str(&format!(
        "Items: {}  Total: {:.2}\n",
        cart.item_count(),
        cart.total()
    ));
    out
}

pub fn render_order(order: &Order) -> String {
    format!(
        "Order {} confirmed for {} <{}>: {} item(s), total {:.2}\n",
        order.order_number,
        order.customer.full_name,
        order.customer.email,
        order.items.iter().map(|i| i.quantity).sum::<u32>(),
        order.total
    )
}
