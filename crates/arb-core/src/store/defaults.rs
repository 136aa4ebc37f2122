use crate::domain::{RuleKind, Section};

/// Rules inserted on first start; existing texts are never overwritten.
pub const DEFAULT_RULES: &[(Section, RuleKind, &str)] = &[
    (
        Section::Group,
        RuleKind::Chat,
        "قوانین ادمین‌های چت:

1. مهم‌ترین قانون، رعایت ادب در برابر ممبرهاست تا بی‌احترامی یا گستاخی نبینید. شوخی‌ها فقط در نجوا انجام شود.

2. هر ادمین چت موظف است روزانه حداقل 800 پیام ارسال کند. در صورت نرسیدن به این آمار:
   - بار اول: اخطار
   - بار دوم: اخطار دوم
   - بار سوم: عزل در صورت نداشتن دلیل منطقی

3. در برخورد با ممبر بی‌ادب (توهین، فحاشی):
   - مرحله اول: اخطار
   - مرحله دوم: سکوت
   - مرحله سوم: بن در پیوی
   سپس، تمام پیام‌های بحث پاک‌سازی و شات برای گارد ارسال شود.

4. در صورت بروز بحث میان ادمین‌ها، فقط مالک یا ادمین ارشد اجازه دخالت دارد. ارائه شهادت فقط در پیوی مالک یا ارشد انجام شود.

5. هنگام ورود به گروه باید علامت ✅ و هنگام اف شدن باید علامت ❌ جهت اطلاع به مالک ارسال شود.

6. چت نباید بدون ادمین باشد. در صورت اف شدن، باید چت به ادمین بعدی تحویل داده شود و در گارد اعلام شود.

7. ادمین چت موظف است در بازی‌های کال شرکت کرده و ممبرها را تگ کند تا به شرکت در بازی ترغیب شوند.

8. هیچ‌کس به‌جز مالک گروه اجازه ویژه دائم یا رهایی کاربران را ندارد.

9. استفاده مداوم از ربات‌های چالش و بازی جهت فعال نگه داشتن فضا الزامی است.

10. مسائل شخصی نباید به گروه منتقل شود.

11. در تایم عضوگیری، حضور ادمین‌ها الزامی است. در صورت غیبت، باید با مالک هماهنگ شود.

12. ادمین چت دسترسی به کال ندارد و نباید در وظایف ادمین کال دخالت کند. مدیریت چت بر عهده شماست.",
    ),
    (
        Section::Group,
        RuleKind::Call,
        "قوانین ادمین‌های کال:

1. رعایت ادب در برابر ممبرها الزامی است. بی‌احترامی به هیچ وجه پذیرفته نیست.

2. هر ادمین کال موظف است حداقل 5 ساعت در روز در کال حضور مؤثر داشته باشد، با ممبرها گفتگو کند، خوش‌آمد بگوید و از همه درخواست مایک کند.

3. ران کردن بازی‌ها به‌ویژه بازی شب مهم‌ترین وظیفه است. بازی شب ساعت 10:30 ران می‌شود و حضور از ساعت 10 الزامی است.

4. برخورد با ممبر بی‌ادب (توهین، فحاشی):
   - مرحله اول: بستن مایک و آرام‌سازی
   - در صورت تکرار: بن با ربات از کف گروه

5. در صورت بروز بحث میان ادمین‌ها، فقط مالک یا ادمین ارشد حق دخالت دارد. شهادت صرفاً در پیوی مالک یا ارشد ارائه شود.

6. هنگام ورود به گروه باید علامت ✅ و هنگام اف شدن باید علامت ❌ جهت اطلاع به مالک ارسال شود.

7. هر ادمین کال دارای تایتل اختصاصی است که باید هنگام حضور در کال از آن استفاده کند. تایتل‌ها باید ذخیره شده و دقیق درج شوند.

8. کال نباید بدون ادمین باشد. در صورت اف شدن، باید به ادمین بعدی تحویل داده شده و این موضوع در گارد اعلام شود. ادمین بعدی نیز باید تأیید کند و تایتل جدید درج نماید.

9. ادمین کال موظف است در بازی‌ها حضور فعال داشته و همراه با ادمین‌های چت، ممبرها را به شرکت در بازی تشویق کند.

10. ادمین کال حق ویژه کردن کاربران را ندارد. در صورت نیاز، باید از ادمین چت درخواست کند و مطابق با قوانین اقدام کند.

11. هر ادمین کال باید روزانه حداقل 300 پیام دعوت به کال ارسال کند (با تگ یا ریپلای).

12. مسائل شخصی نباید به گروه منتقل شود.

13. در تایم عضوگیری، حضور الزامی است. در صورت عدم توانایی، باید با مالک هماهنگ شود.

14. ادمین‌های کال نباید در کار ادمین‌های چت دخالت کنند. مسئولیت کال فقط بر عهده شماست.",
    ),
    (
        Section::Bots,
        RuleKind::General,
        "قوانین ارتباط با ربات‌ها: ابتدا شناسه ربات و مشکل را دقیق بنویسید.",
    ),
    (
        Section::Vserv,
        RuleKind::General,
        "قوانین خدمات مجازی: نوع سرویس و توضیحات کامل را ارسال کنید.",
    ),
];
