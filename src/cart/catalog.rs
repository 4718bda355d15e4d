//! Built-in product list.

use super::{Category, Product};

fn paid(
    id: &str,
    name: &str,
    description: &str,
    price: &str,
    amount: f64,
    category: Category,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        price_label: Some(price.to_string()),
        numeric_price: Some(amount),
        category,
        is_free: false,
        pdf_url: None,
    }
}

fn free(id: &str, name: &str, description: &str, pdf: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        price_label: None,
        numeric_price: None,
        category: Category::Maths,
        is_free: true,
        pdf_url: Some(format!("learningResources/{}", pdf)),
    }
}

pub fn catalog() -> Vec<Product> {
    vec![
        paid(
            "prod1",
            "A-Level Maths Revision Guide",
            "Comprehensive notes and practice questions for A-Level Maths.",
            "£19.99",
            19.99,
            Category::Maths,
        ),
        paid(
            "prod2",
            "AP Physics C Mechanics Workbook",
            "Challenging problems with detailed solutions for AP Physics C: Mechanics.",
            "$24.99",
            24.99,
            Category::Physics,
        ),
        paid(
            "prod3",
            "GCSE Statistics Cheat Sheet Pack",
            "Key formulas and concepts for GCSE Statistics success.",
            "£7.50",
            7.50,
            Category::Maths,
        ),
        paid(
            "prod4",
            "SAT Math Prep Course Access",
            "Full online course with video lessons and practice tests for SAT Math.",
            "$49.00",
            49.00,
            Category::Maths,
        ),
        paid(
            "prod5",
            "University Physics Problem Set Collection",
            "A curated collection of advanced physics problems for university students.",
            "$35.00",
            35.00,
            Category::Physics,
        ),
        free(
            "free1",
            "AP Calculus AB Cheat Sheet",
            "Comprehensive reference sheet covering all essential formulas and concepts for AP Calculus AB.",
            "APCalculusAB_CheatSheet.pdf",
        ),
        free(
            "free2",
            "AP Calculus BC Cheat Sheet",
            "Advanced reference sheet for AP Calculus BC including series, parametric equations, and polar coordinates.",
            "APCalculusBC_CheatSheet.pdf",
        ),
        free(
            "free3",
            "SAT Math Cheat Sheet",
            "Essential formulas and quick reference guide for SAT Math sections covering algebra, geometry, and data analysis.",
            "SAT_Math_CheatSheet.pdf",
        ),
    ]
}

pub fn find_product(id: &str) -> Option<Product> {
    catalog().into_iter().find(|p| p.id == id.trim())
}
