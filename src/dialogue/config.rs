//! Script, keyword and template data for the dialogue engine
//!
//! The defaults are the rice-sales call: four opening lines followed by
//! keyword-triggered answers.

use super::classifier::ResponseCategory;
use crate::{CallbotError, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Opening lines, spoken in order before any keyword reply
    pub script: Vec<String>,

    /// Trigger keywords per category
    pub keywords: CategoryKeywords,

    /// Reply templates per category
    pub templates: CategoryTemplates,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryKeywords {
    pub interest: Vec<String>,
    pub busy: Vec<String>,
    pub price: Vec<String>,
    pub quality: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryTemplates {
    pub interest: Vec<String>,
    pub busy: Vec<String>,
    pub price: Vec<String>,
    pub quality: Vec<String>,
    pub default: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            script: owned(&[
                "こんにちは。私、X商事の高木と申します。突然のお電話失礼いたします。弊社では、主に弁当店様向けにお米の販売を行っておりまして、今日はその中でもおすすめの商品をご紹介させていただければと思い、ご連絡いたしました。",
                "現在ご好評いただいているのが、「近江ブレンド米・小粒タイプ」という商品で、1kgあたり588円（税別・送料込み）でご提供しております。",
                "このお米は、粒が通常より一回り小さいのが特徴で、弁当箱に詰めやすく、見た目のボリューム感が出しやすいと好評です。",
                "もしご興味があれば、無料サンプルをお届けさせていただいておりますので、よろしければ、お店のお名前・ご住所・ご担当者様のお名前をお教えいただけますでしょうか？",
            ]),
            keywords: CategoryKeywords::default(),
            templates: CategoryTemplates::default(),
        }
    }
}

impl Default for CategoryKeywords {
    fn default() -> Self {
        Self {
            interest: owned(&["興味", "関心", "詳しく", "サンプル", "資料", "検討"]),
            busy: owned(&["忙しい", "時間", "用事", "急いで", "急ぎ"]),
            price: owned(&["値段", "価格", "いくら", "安い", "高い", "コスト"]),
            quality: owned(&["米", "ご飯", "品質", "味", "おいしい", "粒"]),
        }
    }
}

impl Default for CategoryTemplates {
    fn default() -> Self {
        Self {
            interest: owned(&[
                "ありがとうございます。では、無料サンプルをお送りさせていただきますね。お店の詳細をお聞かせください。",
                "ご興味をお持ちいただき、ありがとうございます。詳しい資料もご用意しております。",
            ]),
            busy: owned(&[
                "お忙しい中、お時間をいただきありがとうございます。短時間でご説明させていただきます。",
                "お忙しいところ恐縮ですが、2分ほどお時間をいただけますでしょうか。",
            ]),
            price: owned(&[
                "1kgあたり588円（税別・送料込み）でご提供しております。送料も含まれておりますので、お得な価格設定となっております。",
                "価格は1kgあたり588円で、送料込みの価格となっております。",
            ]),
            quality: owned(&[
                "近江ブレンド米は、粒が小さくて弁当に詰めやすく、見た目も美しく仕上がります。味もおいしく、お客様にも好評です。",
                "このお米は特に弁当店様から好評をいただいており、見た目の美しさと味の良さが特徴です。",
            ]),
            default: owned(&[
                "ありがとうございます。他にご質問やご不明な点がございましたら、お気軽にお聞かせください。",
                "承知いたしました。何かご不明な点がございましたら、お気軽にお尋ねください。",
            ]),
        }
    }
}

impl CategoryKeywords {
    /// Keywords for a category. `Default` has none.
    pub fn for_category(&self, category: ResponseCategory) -> &[String] {
        match category {
            ResponseCategory::Interest => &self.interest,
            ResponseCategory::Busy => &self.busy,
            ResponseCategory::Price => &self.price,
            ResponseCategory::Quality => &self.quality,
            ResponseCategory::Default => &[],
        }
    }
}

impl CategoryTemplates {
    pub fn for_category(&self, category: ResponseCategory) -> &[String] {
        match category {
            ResponseCategory::Interest => &self.interest,
            ResponseCategory::Busy => &self.busy,
            ResponseCategory::Price => &self.price,
            ResponseCategory::Quality => &self.quality,
            ResponseCategory::Default => &self.default,
        }
    }
}

impl DialogueConfig {
    /// Replace the opening script
    pub fn with_script<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Every keyword category and every template category must be non-empty.
    /// An empty script is allowed and starts the call in the reactive phase.
    pub fn validate(&self) -> Result<()> {
        for category in ResponseCategory::PRIORITY {
            let keywords = self.keywords.for_category(category);
            if keywords.is_empty() {
                return Err(CallbotError::Config(format!(
                    "no keywords for category '{}'",
                    category.name()
                )));
            }
            if keywords.iter().any(|k| k.is_empty()) {
                return Err(CallbotError::Config(format!(
                    "empty keyword in category '{}'",
                    category.name()
                )));
            }
        }

        for category in ResponseCategory::ALL {
            if self.templates.for_category(category).is_empty() {
                return Err(CallbotError::Config(format!(
                    "no templates for category '{}'",
                    category.name()
                )));
            }
        }

        Ok(())
    }
}
