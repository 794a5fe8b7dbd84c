use serde::{Deserialize, Serialize};

/// 题目分类（成绩按分类统计）
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// 云计算概念
    CloudConcepts,
    /// 安全与合规
    SecurityCompliance,
    /// 技术与服务
    TechnologyServices,
    /// 计费、定价与支持
    BillingPricing,
}

impl Category {
    /// 全部分类，顺序固定
    pub const ALL: [Category; 4] = [
        Category::CloudConcepts,
        Category::SecurityCompliance,
        Category::TechnologyServices,
        Category::BillingPricing,
    ];

    /// 序列化时使用的标识
    pub fn code(self) -> &'static str {
        match self {
            Category::CloudConcepts => "cloud_concepts",
            Category::SecurityCompliance => "security_compliance",
            Category::TechnologyServices => "technology_services",
            Category::BillingPricing => "billing_pricing",
        }
    }

    /// 中文名称
    pub fn name_zh(self) -> &'static str {
        match self {
            Category::CloudConcepts => "云计算概念",
            Category::SecurityCompliance => "安全与合规",
            Category::TechnologyServices => "技术与服务",
            Category::BillingPricing => "计费、定价与支持",
        }
    }

    /// 英文名称
    pub fn name_en(self) -> &'static str {
        match self {
            Category::CloudConcepts => "Cloud Concepts",
            Category::SecurityCompliance => "Security and Compliance",
            Category::TechnologyServices => "Cloud Technology and Services",
            Category::BillingPricing => "Billing, Pricing, and Support",
        }
    }

    pub fn name(self, language: super::Language) -> &'static str {
        match language {
            super::Language::Zh => self.name_zh(),
            super::Language::En => self.name_en(),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name_zh())
    }
}
