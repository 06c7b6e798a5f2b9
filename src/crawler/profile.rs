//! Crawl profiles: what to search for and how to sort the results into category folders.

use super::{CrawlerError, SearchEngine};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A category folder and the keywords that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Extra keyword templates applied only to keywords containing `when_contains`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalModifiers {
    pub when_contains: String,
    pub templates: Vec<String>,
}

fn default_engines() -> Vec<SearchEngine> {
    vec![SearchEngine::Baidu]
}

fn default_per_category() -> usize {
    50
}

fn default_total() -> usize {
    500
}

fn default_pages() -> u32 {
    2
}

/// Everything a crawl run needs to know about one subject. Keyword templates use `{}` for the keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryProfile {
    /// Folder under the images directory.
    pub dir_name: String,
    /// Checked in order; the first match wins.
    pub categories: Vec<Category>,
    pub default_category: String,
    #[serde(default)]
    pub gif_category: Option<String>,
    /// Words in a title or keyword that send a hit to `gif_category`.
    #[serde(default)]
    pub gif_markers: Vec<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub conditional_modifiers: Vec<ConditionalModifiers>,
    /// Extra templates for keywords of the GIF category.
    #[serde(default)]
    pub gif_modifiers: Vec<String>,
    #[serde(default)]
    pub general_keywords: Vec<String>,
    /// Replaces generated keywords entirely when set.
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    /// Removed from keywords when building file names.
    #[serde(default)]
    pub strip_words: Vec<String>,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default = "default_engines")]
    pub engines: Vec<SearchEngine>,
    #[serde(default = "default_per_category")]
    pub max_per_category: usize,
    #[serde(default = "default_total")]
    pub max_total: usize,
    #[serde(default = "default_pages")]
    pub pages: u32,
    /// Only the first N keywords (after shuffling) are searched.
    #[serde(default)]
    pub max_keywords: Option<usize>,
    /// Only the first N hits per keyword are considered.
    #[serde(default)]
    pub hits_per_keyword: Option<usize>,
}

pub const BUILTIN_PROFILES: [&str; 4] = ["animals", "cells", "human-body", "luoxiaohei"];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn cat(name: &str, keywords: &[&str]) -> Category {
    Category {
        name: name.to_string(),
        keywords: strings(keywords),
    }
}

fn base(dir_name: &str, default_category: &str, categories: Vec<Category>) -> CategoryProfile {
    CategoryProfile {
        dir_name: dir_name.to_string(),
        categories,
        default_category: default_category.to_string(),
        gif_category: None,
        gif_markers: Vec::new(),
        modifiers: Vec::new(),
        conditional_modifiers: Vec::new(),
        gif_modifiers: Vec::new(),
        general_keywords: Vec::new(),
        keywords: None,
        strip_words: Vec::new(),
        shuffle: true,
        engines: default_engines(),
        max_per_category: default_per_category(),
        max_total: default_total(),
        pages: default_pages(),
        max_keywords: None,
        hits_per_keyword: None,
    }
}

fn animals() -> CategoryProfile {
    CategoryProfile {
        gif_category: Some("动图专区".to_string()),
        gif_markers: strings(&["gif", "动图", "表情包", "搞笑"]),
        modifiers: strings(&["{} 高清", "可爱{}"]),
        gif_modifiers: strings(&["{} gif", "{} 动图"]),
        general_keywords: strings(&[
            "野生动物", "动物世界", "可爱动物", "动物摄影", "萌宠", "动物园",
            "野生动物园", "动物高清壁纸", "动物gif", "搞笑动物", "动物表情包",
        ]),
        strip_words: strings(&["可爱", "高清"]),
        ..base(
            "动物",
            "野生动物",
            vec![
                cat("猫科动物", &["猫", "老虎", "狮子", "豹子", "猎豹", "美洲豹", "山猫", "猞猁"]),
                cat("犬科动物", &["狗", "狼", "狐狸", "郊狼", "小狗", "金毛", "哈士奇", "柴犬"]),
                cat("鸟类", &["鸟", "老鹰", "鹦鹉", "企鹅", "孔雀", "猫头鹰", "燕子", "鸽子"]),
                cat("海洋动物", &["鲸鱼", "海豚", "鲨鱼", "海龟", "章鱼", "水母", "海马", "螃蟹"]),
                cat("农场动物", &["牛", "马", "羊", "猪", "鸡", "鸭", "鹅", "兔子"]),
                cat("野生动物", &["大象", "长颈鹿", "河马", "犀牛", "斑马", "袋鼠", "熊猫", "考拉"]),
                cat("小动物", &["松鼠", "刺猬", "仓鼠", "兔子", "小鸟", "小猫", "小狗", "小鸭"]),
                cat("动图专区", &["动物动图", "可爱动物gif", "搞笑动物", "动物表情包"]),
            ],
        )
    }
}

fn cells() -> CategoryProfile {
    CategoryProfile {
        modifiers: strings(&["{} microscopy", "{} histology", "{} anatomy"]),
        conditional_modifiers: vec![ConditionalModifiers {
            when_contains: "cells".to_string(),
            templates: strings(&["{} structure", "{} function"]),
        }],
        general_keywords: strings(&[
            "human cells", "cell biology", "cell structure", "cell types",
            "cellular anatomy", "histological sections", "cell microscopy",
            "human histology", "cell morphology", "cellular organelles",
        ]),
        strip_words: strings(&["microscopy", "histology", "anatomy"]),
        engines: vec![SearchEngine::Bing, SearchEngine::Unsplash],
        max_per_category: 25,
        max_total: 300,
        max_keywords: Some(50),
        hits_per_keyword: Some(15),
        ..base(
            "人体细胞",
            "细胞结构",
            vec![
                cat("血液细胞", &[
                    "red blood cells", "erythrocytes", "white blood cells", "leukocytes",
                    "platelets", "thrombocytes", "neutrophils", "lymphocytes", "monocytes",
                    "eosinophils", "basophils", "plasma cells", "macrophages",
                ]),
                cat("神经细胞", &[
                    "neurons", "nerve cells", "glial cells", "astrocytes", "oligodendrocytes",
                    "microglia", "schwann cells", "motor neurons", "sensory neurons",
                    "interneurons", "pyramidal cells", "purkinje cells",
                ]),
                cat("肌肉细胞", &[
                    "muscle cells", "myocytes", "skeletal muscle cells", "cardiac muscle cells",
                    "smooth muscle cells", "muscle fibers", "myofibrils", "cardiomyocytes",
                    "satellite cells",
                ]),
                cat("上皮细胞", &[
                    "epithelial cells", "squamous epithelium", "cuboidal epithelium",
                    "columnar epithelium", "ciliated epithelium", "keratinocytes",
                    "melanocytes", "goblet cells",
                ]),
                cat("结缔组织细胞", &[
                    "fibroblasts", "chondrocytes", "osteoblasts", "osteocytes", "osteoclasts",
                    "adipocytes", "fat cells", "cartilage cells", "bone cells",
                ]),
                cat("免疫细胞", &[
                    "T cells", "B cells", "NK cells", "dendritic cells", "helper T cells",
                    "cytotoxic T cells", "regulatory T cells", "memory cells",
                ]),
                cat("干细胞", &[
                    "stem cells", "embryonic stem cells", "adult stem cells",
                    "mesenchymal stem cells", "hematopoietic stem cells", "neural stem cells",
                    "induced pluripotent stem cells",
                ]),
                cat("生殖细胞", &[
                    "sperm cells", "egg cells", "oocytes", "spermatozoa", "gametes",
                    "follicle cells", "granulosa cells",
                ]),
                cat("消化系统细胞", &[
                    "hepatocytes", "liver cells", "pancreatic cells", "gastric cells",
                    "intestinal cells", "enterocytes", "parietal cells", "chief cells",
                ]),
                cat("肾脏细胞", &[
                    "kidney cells", "nephron cells", "glomerular cells", "tubular cells",
                    "podocytes", "mesangial cells",
                ]),
                cat("癌细胞", &[
                    "cancer cells", "tumor cells", "malignant cells", "carcinoma cells",
                    "adenocarcinoma", "sarcoma cells", "leukemia cells",
                ]),
                cat("细胞结构", &[
                    "cell nucleus", "mitochondria", "ribosomes", "endoplasmic reticulum",
                    "golgi apparatus", "lysosomes", "cell membrane", "cytoplasm",
                    "chromosomes", "DNA", "cell organelles",
                ]),
            ],
        )
    }
}

fn human_body() -> CategoryProfile {
    CategoryProfile {
        modifiers: strings(&["{} 解剖", "{} 结构", "{} 医学"]),
        conditional_modifiers: vec![ConditionalModifiers {
            when_contains: "细胞".to_string(),
            templates: strings(&["{} 显微镜", "{} 电镜"]),
        }],
        general_keywords: strings(&[
            "人体解剖", "人体结构", "医学图谱", "解剖学", "生理学", "组织学", "细胞生物学",
            "人体器官", "医学插图", "解剖图", "人体系统", "生物医学", "临床解剖", "病理解剖",
            "功能解剖",
        ]),
        strip_words: strings(&["解剖", "结构", "医学"]),
        max_per_category: 30,
        max_total: 300,
        ..base(
            "人体器官与细胞",
            "医学影像",
            vec![
                cat("心血管系统", &[
                    "心脏", "血管", "动脉", "静脉", "毛细血管", "心脏解剖", "心脏结构",
                    "血液循环", "心肌", "心房", "心室", "主动脉", "肺动脉",
                ]),
                cat("呼吸系统", &[
                    "肺", "气管", "支气管", "肺泡", "鼻腔", "咽喉", "喉咙", "呼吸道", "肺部结构",
                    "气体交换", "肺叶", "胸腔",
                ]),
                cat("消化系统", &[
                    "胃", "肝脏", "肠道", "小肠", "大肠", "食道", "胰腺", "胆囊", "十二指肠",
                    "结肠", "直肠", "消化道", "胃壁", "肠绒毛",
                ]),
                cat("神经系统", &[
                    "大脑", "脊髓", "神经", "神经元", "大脑皮层", "小脑", "脑干", "神经细胞",
                    "突触", "脑部结构", "中枢神经", "周围神经",
                ]),
                cat("内分泌系统", &[
                    "甲状腺", "肾上腺", "胰岛", "垂体", "下丘脑", "性腺", "内分泌腺", "激素",
                    "胰岛素", "甲状腺激素",
                ]),
                cat("泌尿系统", &[
                    "肾脏", "膀胱", "输尿管", "尿道", "肾单位", "肾小球", "肾小管", "泌尿道",
                    "肾脏结构", "排泄系统",
                ]),
                cat("骨骼肌肉系统", &[
                    "骨骼", "肌肉", "关节", "骨头", "肌纤维", "骨骼结构", "肌肉组织", "骨细胞",
                    "软骨", "韧带", "肌腱",
                ]),
                cat("细胞类型", &[
                    "细胞", "红细胞", "白细胞", "血小板", "神经细胞", "肌细胞", "上皮细胞",
                    "干细胞", "癌细胞", "细胞分裂", "细胞膜", "细胞核", "线粒体", "细胞器", "DNA",
                    "染色体",
                ]),
                cat("组织学", &[
                    "组织", "上皮组织", "结缔组织", "肌肉组织", "神经组织", "血液组织",
                    "淋巴组织", "脂肪组织", "纤维组织",
                ]),
                cat("医学影像", &[
                    "X光", "CT扫描", "MRI", "超声波", "医学影像", "解剖图", "人体结构图",
                    "器官切片", "组织切片", "病理图片",
                ]),
            ],
        )
    }
}

fn luoxiaohei() -> CategoryProfile {
    CategoryProfile {
        keywords: Some(strings(&[
            "罗小黑战记",
            "罗小黑战记 角色",
            "罗小黑战记 壁纸",
            "罗小黑战记 剧照",
            "罗小黑 小白",
            "罗小黑战记 动画",
        ])),
        shuffle: false,
        max_per_category: 100,
        max_total: 100,
        ..base(
            "罗小黑战记",
            "其他",
            vec![
                cat("角色", &["罗小黑", "小黑", "小白", "嘿咻", "周末", "老君", "无限", "谛听", "风息"]),
                cat("场景", &["背景", "场景", "森林", "城市", "建筑", "风景"]),
                cat("剧照", &["剧照", "截图", "电影", "动画"]),
                cat("壁纸", &["壁纸", "桌面", "wallpaper"]),
            ],
        )
    }
}

/// Look up a built-in profile by name.
pub fn builtin_profile(name: &str) -> Result<CategoryProfile, CrawlerError> {
    match name.to_lowercase().as_str() {
        "animals" => Ok(animals()),
        "cells" => Ok(cells()),
        "human-body" | "human_body" => Ok(human_body()),
        "luoxiaohei" => Ok(luoxiaohei()),
        _ => Err(CrawlerError::UnknownProfile {
            name: name.to_string(),
            available: BUILTIN_PROFILES.join(", "),
        }),
    }
}

impl CategoryProfile {
    /// Load a custom profile from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, CrawlerError> {
        let s = std::fs::read_to_string(path).map_err(|e| CrawlerError::ProfileFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let profile: CategoryProfile =
            toml::from_str(&s).map_err(|e| CrawlerError::ProfileFile {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), CrawlerError> {
        if self.dir_name.trim().is_empty() {
            return Err(CrawlerError::InvalidProfile("dir_name is empty".to_string()));
        }
        if self.default_category.trim().is_empty() {
            return Err(CrawlerError::InvalidProfile(
                "default_category is empty".to_string(),
            ));
        }
        if self.engines.is_empty() {
            return Err(CrawlerError::InvalidProfile("no search engines".to_string()));
        }
        let has_keywords = self.keywords.as_ref().is_some_and(|k| !k.is_empty())
            || self.categories.iter().any(|c| !c.keywords.is_empty())
            || !self.general_keywords.is_empty();
        if !has_keywords {
            return Err(CrawlerError::InvalidProfile(
                "profile yields no search keywords".to_string(),
            ));
        }
        Ok(())
    }

    /// Every category folder: listed categories, then the GIF and default categories if not listed.
    pub fn category_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.categories.iter().map(|c| c.name.clone()).collect();
        for extra in self.gif_category.iter().chain(std::iter::once(&self.default_category)) {
            if !names.contains(extra) {
                names.push(extra.clone());
            }
        }
        names
    }

    /// Whether a keyword asks for animated results. Only profiles with a GIF category do.
    pub fn wants_gif(&self, keyword: &str) -> bool {
        self.gif_category.is_some() && {
            let k = keyword.to_lowercase();
            k.contains("gif") || k.contains("动图")
        }
    }

    /// GIF markers first, then the first category whose keyword occurs in the title or
    /// search keyword (case-insensitive), else the default category.
    pub fn categorize(&self, title: &str, keyword: &str) -> &str {
        let title = title.to_lowercase();
        let keyword = keyword.to_lowercase();
        let hit = |word: &str| {
            let w = word.to_lowercase();
            title.contains(&w) || keyword.contains(&w)
        };
        if let Some(ref gif) = self.gif_category {
            if self.gif_markers.iter().any(|m| hit(m)) {
                return gif;
            }
        }
        for c in &self.categories {
            if self.gif_category.as_deref() == Some(c.name.as_str()) {
                continue;
            }
            if c.keywords.iter().any(|k| hit(k)) {
                return &c.name;
            }
        }
        &self.default_category
    }

    /// Keywords to search, in generation order (not shuffled).
    pub fn search_keywords(&self) -> Vec<String> {
        if let Some(ref explicit) = self.keywords {
            return explicit.clone();
        }
        let mut out = Vec::new();
        for c in &self.categories {
            let is_gif = self.gif_category.as_deref() == Some(c.name.as_str());
            for k in &c.keywords {
                out.push(k.clone());
                out.extend(self.modifiers.iter().map(|t| t.replace("{}", k)));
                for cond in &self.conditional_modifiers {
                    if k.contains(&cond.when_contains) {
                        out.extend(cond.templates.iter().map(|t| t.replace("{}", k)));
                    }
                }
                if is_gif {
                    out.extend(self.gif_modifiers.iter().map(|t| t.replace("{}", k)));
                }
            }
        }
        out.extend(self.general_keywords.iter().cloned());
        out
    }

    /// Keywords for a run: generated, shuffled when the profile asks for it, then truncated.
    pub fn run_keywords(&self) -> Vec<String> {
        let mut keywords = self.search_keywords();
        if self.shuffle {
            keywords.shuffle(&mut rand::rng());
        }
        if let Some(n) = self.max_keywords {
            keywords.truncate(n);
        }
        keywords
    }

    /// File-name stem for a keyword: spaces become underscores, strip words are removed.
    pub fn clean_keyword(&self, keyword: &str) -> String {
        let mut s = keyword.replace(' ', "_");
        for w in &self.strip_words {
            s = s.replace(w.as_str(), "");
        }
        let s: String = s
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
                c => c,
            })
            .collect();
        if s.trim_matches('_').is_empty() {
            "image".to_string()
        } else {
            s
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_are_valid() {
        for name in BUILTIN_PROFILES {
            let p = builtin_profile(name).unwrap();
            p.validate().unwrap();
            assert!(!p.search_keywords().is_empty(), "{name}");
        }
        assert!(matches!(
            builtin_profile("dinosaurs"),
            Err(CrawlerError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn animals_categorize_gif_first() {
        let p = builtin_profile("animals").unwrap();
        assert_eq!(p.categorize("搞笑的狗", "狗"), "动图专区");
        assert_eq!(p.categorize("Cute GIF", "猫"), "动图专区");
        assert_eq!(p.categorize("一只老虎", "大型猫科"), "猫科动物");
        assert_eq!(p.categorize("", "熊猫"), "猫科动物");
        assert_eq!(p.categorize("something", "unknown"), "野生动物");
    }

    #[test]
    fn cells_categorize_case_insensitive() {
        let p = builtin_profile("cells").unwrap();
        assert_eq!(p.categorize("Red Blood Cells under SEM", "x"), "血液细胞");
        assert_eq!(p.categorize("", "Dendritic Cells"), "免疫细胞");
        assert_eq!(p.categorize("a photo", "nothing"), "细胞结构");
    }

    #[test]
    fn luoxiaohei_uses_explicit_keywords() {
        let p = builtin_profile("luoxiaohei").unwrap();
        assert_eq!(p.run_keywords()[0], "罗小黑战记");
        assert_eq!(p.search_keywords().len(), 6);
        assert_eq!(p.categorize("风景图", "x"), "场景");
        assert_eq!(p.categorize("x", "罗小黑战记 壁纸"), "角色");
        assert_eq!(p.categorize("x", "y"), "其他");
        assert_eq!(
            p.category_names(),
            vec!["角色", "场景", "剧照", "壁纸", "其他"]
        );
    }

    #[test]
    fn keyword_generation_applies_modifiers() {
        let p = builtin_profile("animals").unwrap();
        let kws = p.search_keywords();
        assert!(kws.contains(&"猫 高清".to_string()));
        assert!(kws.contains(&"可爱猫".to_string()));
        assert!(kws.contains(&"动物动图 gif".to_string()));
        assert!(!kws.contains(&"猫 gif".to_string()));
        assert_eq!(kws.last().map(String::as_str), Some("动物表情包"));

        let cells = builtin_profile("cells").unwrap();
        let kws = cells.search_keywords();
        assert!(kws.contains(&"red blood cells structure".to_string()));
        assert!(!kws.contains(&"erythrocytes structure".to_string()));
        assert_eq!(cells.run_keywords().len(), 50);
    }

    #[test]
    fn gif_search_only_with_gif_category() {
        let animals = builtin_profile("animals").unwrap();
        assert!(animals.wants_gif("动物 GIF"));
        assert!(animals.wants_gif("猫 动图"));
        assert!(!animals.wants_gif("猫"));
        let body = builtin_profile("human-body").unwrap();
        assert!(!body.wants_gif("心脏 gif"));
    }

    #[test]
    fn clean_keyword_strips_modifiers() {
        let animals = builtin_profile("animals").unwrap();
        assert_eq!(animals.clean_keyword("可爱猫 高清"), "猫_");
        let cells = builtin_profile("cells").unwrap();
        assert_eq!(cells.clean_keyword("red blood cells microscopy"), "red_blood_cells_");
        assert_eq!(cells.clean_keyword("a/b"), "a_b");
        assert_eq!(cells.clean_keyword("microscopy"), "image");
    }

    #[test]
    fn custom_profile_from_toml() {
        let dir = std::env::temp_dir().join(format!("bookpress_profile_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("plants.toml");
        std::fs::write(
            &path,
            r#"
                dir_name = "植物"
                default_category = "其他"
                engines = ["bing"]
                max_total = 20
                modifiers = ["{} 高清"]
                [[categories]]
                name = "花"
                keywords = ["玫瑰", "郁金香"]
            "#,
        )
        .unwrap();
        let p = CategoryProfile::from_toml_file(&path).unwrap();
        assert_eq!(p.engines, vec![SearchEngine::Bing]);
        assert_eq!(p.max_per_category, 50);
        assert_eq!(p.pages, 2);
        assert!(!p.shuffle);
        assert_eq!(
            p.search_keywords(),
            vec!["玫瑰", "玫瑰 高清", "郁金香", "郁金香 高清"]
        );
        assert_eq!(p.category_names(), vec!["花", "其他"]);

        std::fs::write(&path, "dir_name = \"x\"\ndefault_category = \"y\"\ncategories = []\n").unwrap();
        assert!(matches!(
            CategoryProfile::from_toml_file(&path),
            Err(CrawlerError::InvalidProfile(_))
        ));
        std::fs::remove_dir_all(&dir).ok();
    }
}
